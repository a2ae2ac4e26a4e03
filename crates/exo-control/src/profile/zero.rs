//! 零力矩曲线（透明模式）

use super::{ProfileInput, TorqueProfile};
use crate::error::ProfileError;
use exo_protocol::NewtonMeter;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZeroProfile;

impl TorqueProfile for ZeroProfile {
    type Params = ();

    fn name(&self) -> &'static str {
        "zero"
    }

    fn set_parameters(&mut self, _params: &()) -> Result<(), ProfileError> {
        Ok(())
    }

    fn evaluate(&self, _input: &ProfileInput) -> Result<NewtonMeter, ProfileError> {
        Ok(NewtonMeter::ZERO)
    }

    fn is_configured(&self) -> bool {
        true
    }
}
