//! Scriptable test double for the [`Sensor`] contract.
//!
//! Host only.  The driver and the test keep a shared [`FakeControl`]
//! handle, so behaviour can be changed and calls counted after the driver
//! has been boxed into a hub.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::reading::Reading;
use super::{Availability, AvailabilityState, Sensor, SensorKind};
use crate::error::SensorError;
use crate::payload::FieldSet;

#[derive(Debug, Default)]
struct FakeState {
    /// Consumed front to back; once empty, `init_default` applies.
    init_script: VecDeque<Result<(), SensorError>>,
    init_default: Option<SensorError>,
    read_error: Option<SensorError>,
    values: Reading,
    compensation_c: Option<f32>,
    init_calls: usize,
    read_calls: usize,
}

/// Shared handle onto a [`FakeSensor`].
#[derive(Debug, Clone, Default)]
pub struct FakeControl(Rc<RefCell<FakeState>>);

impl FakeControl {
    /// Make every `init()` fail with `error` (or succeed with `None`).
    pub fn set_init_result(&self, error: Option<SensorError>) {
        self.0.borrow_mut().init_default = error;
    }

    /// Queue one-shot init outcomes ahead of the default.
    pub fn script_init(&self, outcomes: impl IntoIterator<Item = Result<(), SensorError>>) {
        self.0.borrow_mut().init_script.extend(outcomes);
    }

    pub fn set_read_error(&self, error: Option<SensorError>) {
        self.0.borrow_mut().read_error = error;
    }

    /// Values copied into the owned fields on a successful read.
    pub fn set_values(&self, values: Reading) {
        self.0.borrow_mut().values = values;
    }

    pub fn init_calls(&self) -> usize {
        self.0.borrow().init_calls
    }

    pub fn read_calls(&self) -> usize {
        self.0.borrow().read_calls
    }

    /// Last compensation temperature forwarded by the hub.
    pub fn compensation(&self) -> Option<f32> {
        self.0.borrow().compensation_c
    }
}

pub struct FakeSensor {
    kind: SensorKind,
    fields: FieldSet,
    availability: AvailabilityState,
    control: FakeControl,
}

impl FakeSensor {
    /// A fake that owns the same fields as the real `kind`.
    pub fn new(kind: SensorKind) -> Self {
        Self::with_fields(kind, kind.fields())
    }

    pub fn with_fields(kind: SensorKind, fields: FieldSet) -> Self {
        Self {
            kind,
            fields,
            availability: AvailabilityState::new(),
            control: FakeControl::default(),
        }
    }

    pub fn control(&self) -> FakeControl {
        self.control.clone()
    }
}

impl Sensor for FakeSensor {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn fields(&self) -> FieldSet {
        self.fields
    }

    fn availability(&self) -> Availability {
        self.availability.get()
    }

    fn init(&mut self) -> Result<(), SensorError> {
        let outcome = {
            let mut state = self.control.0.borrow_mut();
            state.init_calls += 1;
            let default = state.init_default.map_or(Ok(()), Err);
            state.init_script.pop_front().unwrap_or(default)
        };
        let name = self.name();
        self.availability.record_init(name, outcome)
    }

    fn read_all(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        let mut state = self.control.0.borrow_mut();
        state.read_calls += 1;
        if let Some(e) = state.read_error {
            reading.mark_failed(self.fields);
            return Err(e);
        }
        reading.merge_from(&state.values, self.fields);
        Ok(())
    }

    fn set_compensation_temperature(&mut self, celsius: f32) {
        self.control.0.borrow_mut().compensation_c = Some(celsius);
    }

    fn set_available_for_testing(&mut self, available: bool) {
        let name = self.name();
        self.availability.force(name, available);
    }
}
