use glam::Vec3;

use crate::ai::AiOpponent;
use crate::arena::{ArenaContact, ArenaEntity, TableArena};
use crate::config::GameConfig;
use crate::event::MatchEvent;
use crate::net::{
    InboundQueue, NetworkMessage, NetworkStats, NetworkSync, PaddleSample, Transport, ball_message, flush,
    from_wire, paddle_message,
};
use crate::paddle::{PaddleBody, project_pointer};
use crate::physics::{BallSimulation, BallState, BodyPose};
use crate::rollback::RollbackReconciler;
use crate::rules::{
    Contact, PaddleKinematics, Phase, PlayerId, RuleContext, RuleStateMachine, Roster, Scoreboard,
    Side,
};
use crate::simulation::SimulationMode;
use crate::trajectory::TrajectorySynthesizer;

pub const SOLO_HOST: PlayerId = 1;
pub const SOLO_AI: PlayerId = 2;

fn rule_context<'a>(
    tick: u32,
    arena: &'a mut TableArena,
    outbound: &'a mut Vec<NetworkMessage>,
    reconciler: &'a mut RollbackReconciler,
) -> RuleContext<'a> {
    RuleContext {
        tick,
        ball: arena,
        outbound,
        reconciler: Some(reconciler),
    }
}

/// One table, two paddles and everything needed to play a match on it.
///
/// Each fixed tick runs, in order: inbound messages, tosses, paddle
/// targets, the physics step, contact rules, the host's reset timer, ball
/// history, periodic broadcasts and finally the outbound flush.
pub struct TableMatch {
    config: GameConfig,
    roster: Roster,
    arena: TableArena,
    paddles: [PaddleBody; 2],
    rules: RuleStateMachine<TrajectorySynthesizer>,
    reconciler: RollbackReconciler,
    sync: NetworkSync,
    inbound: InboundQueue,
    transport: Option<Box<dyn Transport>>,
    outbound: Vec<NetworkMessage>,
    ais: Vec<AiOpponent>,
    pointer: Option<Vec3>,
    toss_requested: bool,
    tick: u32,
    alpha: f32,
    events: Vec<MatchEvent>,
}

impl TableMatch {
    fn build(
        config: GameConfig,
        roster: Roster,
        transport: Option<Box<dyn Transport>>,
        inbound: InboundQueue,
    ) -> Self {
        let arena = TableArena::new(&config.simulation, &config.table);
        let paddles = [Side::Left, Side::Right]
            .map(|side| PaddleBody::new(side, &config.table, config.paddle.clone()));
        let planner = TrajectorySynthesizer::new(config.trajectory.clone(), config.table.clone());
        let rules = RuleStateMachine::new(
            planner,
            roster,
            config.rules.clone(),
            config.table.clone(),
        );

        Self {
            reconciler: RollbackReconciler::new(config.rollback.clone()),
            sync: NetworkSync::new(&config.sync, roster.is_host()),
            config,
            roster,
            arena,
            paddles,
            rules,
            inbound,
            transport,
            outbound: Vec::new(),
            ais: Vec::new(),
            pointer: None,
            toss_requested: false,
            tick: 0,
            alpha: 0.0,
            events: Vec::new(),
        }
    }

    /// A local match against the computer, which plays the right side.
    pub fn solo(config: GameConfig) -> Self {
        let roster = Roster::new(SOLO_HOST, SOLO_AI, SOLO_HOST).with_ai(SOLO_AI);
        let ai = AiOpponent::new(config.ai.clone(), Side::Right, &config.table);
        let mut table_match = Self::build(config, roster, None, InboundQueue::new());
        table_match.ais.push(ai);
        log::info!("solo match created");
        table_match
    }

    /// One peer of a networked match. `inbound` is the queue the transport's
    /// peer delivers into.
    pub fn networked(
        config: GameConfig,
        transport: Box<dyn Transport>,
        inbound: InboundQueue,
    ) -> Self {
        let [host, guest] = transport.players();
        let roster = Roster::new(host, guest, transport.local_player());
        let mut table_match = Self::build(config, roster, Some(transport), inbound);
        table_match.sync.start();
        log::info!(
            "networked match created for player {} (host: {})",
            roster.local,
            roster.is_host()
        );
        table_match
    }

    /// Lets the computer drive the local paddle.
    pub fn with_autopilot(mut self) -> Self {
        let side = self.roster.local_side();
        if self.ais.iter().any(|ai| ai.side() == side) {
            return self;
        }
        let mut ai_config = self.config.ai.clone();
        ai_config.seed = ai_config.seed.wrapping_add(u64::from(self.roster.local));
        self.ais
            .push(AiOpponent::new(ai_config, side, &self.config.table));
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn phase(&self) -> Phase {
        self.rules.phase()
    }

    pub fn rules(&self) -> &RuleStateMachine<TrajectorySynthesizer> {
        &self.rules
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        self.rules.scoreboard()
    }

    pub fn ball_state(&self) -> BallState {
        self.arena.ball_state()
    }

    pub fn reconciler(&self) -> &RollbackReconciler {
        &self.reconciler
    }

    pub fn paddle(&self, side: Side) -> &PaddleBody {
        &self.paddles[side.index()]
    }

    pub fn sync(&self) -> &NetworkSync {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut NetworkSync {
        &mut self.sync
    }

    pub fn transport(&self) -> Option<&dyn Transport> {
        self.transport.as_deref()
    }

    /// Outbound counters, when the transport keeps any.
    pub fn link_stats(&self) -> Option<&NetworkStats> {
        self.transport.as_deref()?.stats()
    }

    pub fn inbound_stats(&self) -> &NetworkStats {
        self.inbound.stats()
    }

    /// Ball pose for drawing, blended between ticks and offset by any
    /// pending correction.
    pub fn ball_pose(&self) -> BodyPose {
        let mut pose = self.arena.interpolated_pose(ArenaEntity::Ball, self.alpha);
        pose.position = self.reconciler.display_position(pose.position);
        pose
    }

    pub fn paddle_pose(&self, side: Side) -> BodyPose {
        self.arena
            .interpolated_pose(ArenaEntity::Paddle(side), self.alpha)
    }

    /// Aims the local paddle at a point on its plane.
    pub fn set_pointer(&mut self, target: Vec3) {
        if target.is_finite() {
            self.pointer = Some(target);
        }
    }

    /// Aims the local paddle where a pointer ray meets its plane. Returns
    /// false when the ray misses.
    pub fn set_pointer_ray(&mut self, origin: Vec3, direction: Vec3) -> bool {
        match project_pointer(origin, direction, self.config.table.paddle_height) {
            Some(point) => {
                self.pointer = Some(point);
                true
            }
            None => false,
        }
    }

    /// Asks to toss on the next tick. Ignored unless it is the local
    /// player's serve.
    pub fn request_toss(&mut self) {
        self.toss_requested = true;
    }

    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    fn receive(&mut self, last_tick: u32) {
        for received in self.inbound.drain() {
            if let NetworkMessage::PaddleState {
                position,
                rotation,
                velocity,
            } = received.message
            {
                if self.roster.remote() == Some(received.sender) {
                    self.sync.receive_paddle(PaddleSample {
                        position: from_wire(position),
                        rotation,
                        velocity: from_wire(velocity),
                    });
                }
                continue;
            }

            let mut ctx = rule_context(
                last_tick,
                &mut self.arena,
                &mut self.outbound,
                &mut self.reconciler,
            );
            self.rules
                .on_message(&received.message, received.sender, &mut ctx);
        }
    }

    fn handle_tosses(&mut self, tick: u32) {
        if std::mem::take(&mut self.toss_requested) {
            let mut ctx = rule_context(tick, &mut self.arena, &mut self.outbound, &mut self.reconciler);
            self.rules.begin_toss(self.roster.local, &mut ctx);
        }

        let rally = self.rules.rally();
        let waiting = rally.is_waiting() && !rally.toss_in_progress && !rally.point_ended;
        let server = rally.server;

        let mut tosser = None;
        for ai in &mut self.ais {
            if ai.should_toss(waiting && ai.side() == server) {
                tosser = Some(self.roster.player_on(ai.side()));
            }
        }
        if let Some(player) = tosser {
            let mut ctx = rule_context(tick, &mut self.arena, &mut self.outbound, &mut self.reconciler);
            self.rules.begin_toss(player, &mut ctx);
        }
    }

    fn drive_paddles(&mut self) {
        let dt = self.arena.dt();
        let ball = self.arena.ball_state();
        let rally = self.rules.rally();
        let local_side = self.roster.local_side();
        let mut autopiloted = false;

        for ai in &mut self.ais {
            let side = ai.side();
            autopiloted |= side == local_side;
            let paddle = &mut self.paddles[side.index()];
            let target = if !rally.is_waiting() {
                ai.target(&ball, paddle.position())
            } else if rally.toss_in_progress && rally.server == side {
                ai.serve_target(ball.position, paddle.position())
            } else {
                ai.home()
            };
            paddle.set_target(target);
        }

        if !autopiloted {
            if let Some(pointer) = self.pointer {
                self.paddles[local_side.index()].set_target(pointer);
            }
        }

        for side in [Side::Left, Side::Right] {
            let driven_here = self.roster.controls(self.roster.player_on(side));
            let paddle = &mut self.paddles[side.index()];
            if driven_here {
                let position = paddle.advance(dt);
                self.arena.move_paddle(side, position, paddle.rotation());
            } else if let Some(sample) = self.sync.remote_paddle() {
                paddle.set_pose(sample.position, sample.rotation, sample.velocity);
                self.arena
                    .move_paddle(side, paddle.position(), paddle.rotation());
            }
        }
    }

    fn contact_for(&self, contact: ArenaContact) -> Contact {
        match contact {
            ArenaContact::Paddle(side) => {
                let paddle = &self.paddles[side.index()];
                Contact::Paddle {
                    player: self.roster.player_on(side),
                    paddle: PaddleKinematics {
                        position: paddle.position(),
                        velocity: paddle.velocity(),
                    },
                }
            }
            ArenaContact::Table { side } => Contact::Table { side },
            ArenaContact::Net => Contact::Net,
            ArenaContact::Floor => Contact::Floor,
        }
    }

    fn broadcast(&mut self, tick: u32) {
        if self.transport.is_none() {
            self.outbound.clear();
            return;
        }

        // Send timers run on simulated time; their rates are their own.
        let due = self.sync.advance(f64::from(self.arena.dt()));
        if due.paddle {
            let paddle = &self.paddles[self.roster.local_side().index()];
            self.outbound.push(paddle_message(
                paddle.position(),
                paddle.roll(),
                paddle.velocity(),
            ));
        }
        if due.ball {
            let ball = self.arena.ball_state();
            if !ball.frozen && !self.rules.rally().point_ended {
                self.outbound
                    .push(ball_message(&ball, tick, self.rules.rally().effects));
            }
        }

        if let Some(transport) = self.transport.as_deref_mut() {
            flush(transport, &mut self.outbound);
            transport.pump();
        }
    }
}

impl SimulationMode for TableMatch {
    fn fixed_update(&mut self, tick: u32) {
        let last_tick = self.tick;
        self.tick = tick;

        // Remote state refers to ticks already simulated here.
        self.receive(last_tick);
        self.handle_tosses(tick);
        self.drive_paddles();

        let contacts = self.arena.step();
        for contact in contacts {
            let contact = self.contact_for(contact);
            let mut ctx = rule_context(tick, &mut self.arena, &mut self.outbound, &mut self.reconciler);
            self.rules.on_contact(contact, &mut ctx);
        }
        {
            let mut ctx = rule_context(tick, &mut self.arena, &mut self.outbound, &mut self.reconciler);
            self.rules.update(&mut ctx);
        }

        self.reconciler.decay_visual_offset();
        self.reconciler.record_state(tick, &self.arena.ball_state());

        self.broadcast(tick);

        let events = self.rules.drain_events();
        if events.contains(&MatchEvent::RallyReset) {
            self.sync.clear_remote();
        }
        self.events.extend(events);
    }

    fn interpolate(&mut self, alpha: f32) {
        self.alpha = alpha;
    }
}
