pub mod composer;
pub mod consumer;
pub mod correlation;
pub mod gate;
pub mod notifier;
