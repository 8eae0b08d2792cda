/// Events emitted by the simulation during a tick. The UI layer consumes
/// them for sound effects; the sim itself never depends on them.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Jump,
    Dash,
    Shoot,
    /// Kunai swing.
    Strike,
    /// The player took a hit.
    PlayerHit,
    /// An attack bounced off the protected boss.
    Deflect,
    Pickup,
    EnemyDied,
    BossHit,
    BossDefeated,
    PlayerDied,
    LevelClear,
}
