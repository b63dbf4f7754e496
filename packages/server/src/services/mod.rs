pub mod notifier;
pub mod payment;
pub mod settings;
