use wheelkit::RollOutcome;
use wheelkit::control::Command;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Control(Command),
    /// A roll or replay finished on the runtime; errors are already rendered.
    RollResolved(Result<RollOutcome, String>),
    ConfigReload,
}
