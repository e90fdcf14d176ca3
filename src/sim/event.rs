/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and the end banner.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Jumped,
    HazardDeath,
    FellIntoPit,
    LevelCleared,
}
