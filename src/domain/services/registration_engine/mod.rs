//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Registration rules for a single event: couple and single signup, removal and auto-pairing.
//
// | Component            | Description                                                |
// |----------------------|------------------------------------------------------------|
// | RegistrationEngine   | In-memory state machine over one event aggregate           |
//--------------------------------------------------------------------------------------------------

pub mod registration_engine;

#[cfg(test)]
mod tests;

pub use self::registration_engine::RegistrationEngine;
