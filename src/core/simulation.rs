//! Level simulation and the per-tick loop
//!
//! [`LevelSimulation`] owns one level's mutable state: the world, the enemy
//! agents, the player, the shared path cache and the random stream. Nothing is
//! global, so several simulations can run side by side.

use fastrand::Rng;
use glam::Vec2;

use crate::ai::{
    AiContext, AiState, Enemy, GUNFIRE_RADIUS, PathCache, cell_distance, damage_enemy, player_shot_damage,
    propagate_sound, start_state, update_enemy,
};
use crate::animation::SpriteSelector;
use crate::core::{
    EventQueue, LevelDescriptor, LevelError, LevelPack, SimConfig, SimEvent, SimStats, SoundCue, TickClock,
};
use crate::player::{KeyKind, MAX_AMMO, MAX_HEALTH, Player, PlayerIntent};
use crate::world::{CellKind, DoorOpenOutcome, PickupKind, World, cell_center, world_to_cell};

/// Reach of the player's weapon in world units
pub const WEAPON_RANGE: f32 = 64.0;
/// Largest miss distance from the aim ray that still hits
pub const AIM_TOLERANCE: f32 = 0.6;
/// Distance ahead of the player probed for a door
pub const INTERACT_DISTANCE: f32 = 1.5;
/// Distance within which items are picked up
pub const PICKUP_RADIUS: f32 = 0.8;

/// One running level
#[derive(Debug)]
pub struct LevelSimulation {
    config: SimConfig,
    world: World,
    enemies: Vec<Enemy>,
    player: Player,
    paths: PathCache,
    rng: Rng,
    events: EventQueue,
    clock: TickClock,
    stats: SimStats,
}

impl LevelSimulation {
    /// Load a level and spawn its enemies and player
    ///
    /// # Errors
    ///
    /// Returns an error if the level data is malformed
    pub fn new(level: &LevelDescriptor, config: SimConfig) -> Result<Self, LevelError> {
        let world = level.build_world()?;
        let scale = config.difficulty.scale();

        let mut enemies = Vec::with_capacity(level.enemies.len());
        for placement in &level.enemies {
            if !placement.spawns_on(config.difficulty) {
                continue;
            }
            if world.grid.kind(placement.cell) != Some(CellKind::Empty) {
                log::warn!("{} at {} is inside a wall or door, skipped", placement.kind.name(), placement.cell);
                continue;
            }
            let mut enemy = Enemy::new(placement.kind, placement.cell, placement.facing, scale);
            enemy.floor_height = world.grid.floor_height(placement.cell);
            if placement.patrol {
                enemy.state = AiState::Patrol;
            }
            enemies.push(enemy);
        }

        let mut player = Player::new(cell_center(level.player.cell), level.player.facing);
        player.floor_height = world.grid.floor_height(level.player.cell);

        log::info!(
            "level '{}' loaded on {:?}: {} enemies",
            level.name,
            config.difficulty,
            enemies.len()
        );

        let mut sim = Self {
            paths: PathCache::with_window(config.path_cache_ticks),
            rng: Rng::with_seed(config.seed),
            config,
            world,
            enemies,
            player,
            events: EventQueue::new(),
            clock: TickClock::new(),
            stats: SimStats::new(),
        };

        // Roll the stand and patrol timers of the spawn state
        let (enemies, mut ctx) = sim.ai_context(0.0);
        for (index, enemy) in enemies.iter_mut().enumerate() {
            ctx.index = index;
            start_state(enemy, &mut ctx);
        }
        Ok(sim)
    }

    /// Load level `index` of a pack
    ///
    /// # Errors
    ///
    /// Returns an error if the index is missing or the level is malformed
    pub fn from_pack(pack: &LevelPack, index: usize, config: SimConfig) -> Result<Self, LevelError> {
        Self::new(pack.level(index)?, config)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The world
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The world (mutable)
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// All enemies, corpses included
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// All enemies (mutable)
    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    /// The player
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// The player (mutable)
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Events produced by the last tick
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Ticks simulated so far
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.clock.tick()
    }

    /// Simulated seconds so far
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Statistics
    #[must_use]
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Sprite for an enemy as seen by the player
    #[must_use]
    pub fn sprite(&self, index: usize) -> Option<SpriteSelector> {
        self.enemies
            .get(index)
            .map(|enemy| SpriteSelector::select(enemy, self.player.position))
    }

    /// Split borrows: the enemy list plus a context over everything else
    fn ai_context(&mut self, delta_time: f32) -> (&mut Vec<Enemy>, AiContext<'_>) {
        let Self {
            config,
            world,
            enemies,
            player,
            paths,
            rng,
            events,
            stats,
            ..
        } = self;
        (
            enemies,
            AiContext {
                world,
                player,
                paths,
                rng,
                events,
                stats,
                delta_time,
                drop_ammo: config.drop_ammo,
                index: 0,
            },
        )
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance the simulation by one frame.
    ///
    /// Events pushed during this call (and by player actions since the last
    /// tick) are readable through [`LevelSimulation::events`] afterwards.
    pub fn tick(&mut self, raw_delta: f32) {
        let dt = self.clock.advance(raw_delta);
        self.paths.begin_tick(self.clock.tick());

        // Doors never close on the player or a living enemy
        let player_cell = world_to_cell(self.player.position);
        let enemies = &self.enemies;
        self.world.doors.update(
            dt,
            |cell| cell == player_cell || enemies.iter().any(|e| e.is_alive() && e.cell == cell),
            &mut self.events,
        );

        let (enemies, mut ctx) = self.ai_context(dt);
        for (index, enemy) in enemies.iter_mut().enumerate() {
            ctx.index = index;
            update_enemy(enemy, &mut ctx);
        }

        for enemy in &mut self.enemies {
            enemy.hit_flash_ticks = enemy.hit_flash_ticks.saturating_sub(1);
            enemy.muzzle_flash_ticks = enemy.muzzle_flash_ticks.saturating_sub(1);
        }

        self.collect_pickups();

        self.stats.record_tick(dt);
        self.stats.path_queries = self.paths.hits() + self.paths.misses();
        self.stats.path_cache_hits = self.paths.hits();
        self.stats.path_expansions = self.paths.expansions();

        self.events.swap();
    }

    fn collect_pickups(&mut self) {
        let Self {
            world,
            player,
            events,
            ..
        } = self;
        if !player.is_alive() {
            return;
        }

        for pickup in world.pickups.iter_mut().filter(|p| !p.taken) {
            if pickup.position.distance(player.position) > PICKUP_RADIUS {
                continue;
            }
            let taken = match pickup.kind {
                PickupKind::GoldKey => {
                    player.keys.give(KeyKind::Gold);
                    true
                }
                PickupKind::SilverKey => {
                    player.keys.give(KeyKind::Silver);
                    true
                }
                PickupKind::Food | PickupKind::FirstAid if player.health >= MAX_HEALTH => false,
                PickupKind::Food => {
                    player.heal(10);
                    true
                }
                PickupKind::FirstAid => {
                    player.heal(25);
                    true
                }
                PickupKind::Clip | PickupKind::DroppedClip if player.ammo >= MAX_AMMO => false,
                PickupKind::Clip => {
                    player.add_ammo(8);
                    true
                }
                PickupKind::DroppedClip => {
                    player.add_ammo(4);
                    true
                }
            };
            if taken {
                pickup.taken = true;
                log::debug!("picked up {:?}", pickup.kind);
                events.push(SimEvent::PickupCollected { kind: pickup.kind });
            }
        }
    }

    // ========================================================================
    // Player Actions
    // ========================================================================

    /// Apply the player controller's intent for this tick
    pub fn apply_intent(&mut self, intent: PlayerIntent) {
        self.player.position = intent.position;
        self.player.angle = intent.angle;
        self.player.floor_height = intent.floor_height;
        self.player.running = intent.running;

        if intent.interact {
            self.player_interact();
        }
        if intent.fire {
            self.player_fire();
        }
    }

    /// Hit-scan shot along the player's facing. Returns the index of the enemy hit.
    pub fn player_fire(&mut self) -> Option<usize> {
        if !self.player.is_alive() || self.player.ammo == 0 {
            return None;
        }
        self.player.ammo -= 1;
        let origin = self.player.position;
        let floor = self.player.floor_height;
        self.events.push(SimEvent::PlaySound {
            cue: SoundCue::PlayerFire,
            position: origin,
        });
        self.make_noise(origin, GUNFIRE_RADIUS, floor);

        let target = self.aim_target()?;
        let distance = cell_distance(world_to_cell(origin), self.enemies[target].cell);
        let damage = player_shot_damage(distance, self.rng.u8(..));
        log::debug!("player shot {} #{target} for {damage}", self.enemies[target].kind.name());
        self.damage_enemy(target, damage);
        Some(target)
    }

    /// Nearest living enemy on the aim ray and in sight
    fn aim_target(&self) -> Option<usize> {
        let origin = self.player.position;
        let forward = self.player.forward();

        self.enemies
            .iter()
            .enumerate()
            .filter(|(_, enemy)| enemy.is_alive())
            .filter_map(|(index, enemy)| {
                let to_enemy = enemy.position - origin;
                let along = to_enemy.dot(forward);
                if along <= 0.0 || along > WEAPON_RANGE {
                    return None;
                }
                let miss = (to_enemy - forward * along).length();
                (miss <= AIM_TOLERANCE).then_some((index, along))
            })
            .filter(|&(index, _)| {
                let enemy = &self.enemies[index];
                self.world.has_line_of_sight_at(
                    origin,
                    self.player.floor_height,
                    enemy.position,
                    enemy.floor_height,
                )
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    /// Use the door just ahead of the player
    pub fn player_interact(&mut self) -> DoorOpenOutcome {
        let probe = self.player.position + self.player.forward() * INTERACT_DISTANCE;
        let cell = world_to_cell(probe);
        self.world.doors.try_open(cell, &self.player.keys, &mut self.events)
    }

    /// Damage an enemy. Returns `true` if the hit killed it; no-op for corpses.
    pub fn damage_enemy(&mut self, index: usize, amount: i32) -> bool {
        let dt = self.clock.delta();
        let (enemies, mut ctx) = self.ai_context(dt);
        let Some(enemy) = enemies.get_mut(index) else {
            return false;
        };
        ctx.index = index;
        damage_enemy(enemy, amount, &mut ctx)
    }

    /// Emit a noise; returns how many enemies went to investigate
    pub fn make_noise(&mut self, origin: Vec2, radius: f32, floor_height: f32) -> usize {
        let dt = self.clock.delta();
        let (enemies, mut ctx) = self.ai_context(dt);
        propagate_sound(enemies, origin, radius, floor_height, &mut ctx)
    }
}
