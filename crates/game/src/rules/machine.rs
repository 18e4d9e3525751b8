use glam::Vec3;

use super::score::Scoreboard;
use super::state::{
    EffectFlags, Phase, PlayerId, PointEnd, PointEndReason, RallyState, Roster, Side,
};
use crate::config::{RulesConfig, TableConfig};
use crate::event::{EventQueue, MatchEvent};
use crate::net::{NetworkMessage, OutboundMessages, from_wire, to_wire};
use crate::physics::{BallSimulation, BallState};
use crate::rollback::RollbackReconciler;
use crate::trajectory::{ShotInput, ShotPlanner};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleKinematics {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// A ball contact as the rules see it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    Paddle {
        player: PlayerId,
        paddle: PaddleKinematics,
    },
    Table {
        side: Side,
    },
    Net,
    Floor,
}

/// What the rules may touch during one call.
pub struct RuleContext<'a> {
    pub tick: u32,
    pub ball: &'a mut dyn BallSimulation,
    pub outbound: &'a mut dyn OutboundMessages,
    pub reconciler: Option<&'a mut RollbackReconciler>,
}

impl RuleContext<'_> {
    /// Installs an authoritative ball state, through the reconciler when
    /// there is one.
    fn accept_ball(&mut self, state: &BallState, tick: u32) {
        match self.reconciler.as_deref_mut() {
            Some(reconciler) => {
                reconciler.reconcile(state, tick, self.tick, &mut *self.ball);
            }
            None => self.ball.set_ball_state(state),
        }
    }
}

/// Serve/rally phases, bounce legality and point endings.
///
/// Only the host judges bounces and ends points. Either peer judges hits by
/// the paddles it drives and broadcasts them; hits by the other peer's
/// paddle arrive as messages and are taken as they are.
pub struct RuleStateMachine<P> {
    planner: P,
    roster: Roster,
    config: RulesConfig,
    table: TableConfig,
    rally: RallyState,
    scoreboard: Scoreboard,
    next_server: Side,
    reset_at: Option<u32>,
    last_authoritative_tick: Option<u32>,
    events: EventQueue,
}

impl<P: ShotPlanner> RuleStateMachine<P> {
    pub fn new(planner: P, roster: Roster, config: RulesConfig, table: TableConfig) -> Self {
        let server = Side::Left;
        let scoreboard = Scoreboard::new(server, config.points_to_win, config.serves_per_turn);
        let rally = RallyState::new(server, roster.controls(roster.player_on(server)));
        Self {
            planner,
            roster,
            config,
            table,
            rally,
            scoreboard,
            next_server: server,
            reset_at: None,
            last_authoritative_tick: None,
            events: EventQueue::new(),
        }
    }

    pub fn planner(&self) -> &P {
        &self.planner
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn rally(&self) -> &RallyState {
        &self.rally
    }

    pub fn phase(&self) -> Phase {
        self.rally.phase
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn server_player(&self) -> PlayerId {
        self.roster.player_on(self.rally.server)
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_at.is_some()
    }

    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        self.events.drain()
    }

    fn is_host(&self) -> bool {
        self.roster.is_host()
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.rally.phase != phase {
            log::debug!("phase {:?} -> {:?}", self.rally.phase, phase);
            self.rally.phase = phase;
            self.events.push(MatchEvent::PhaseChanged(phase));
        }
    }

    fn bump_authoritative(&mut self, tick: u32) {
        self.last_authoritative_tick = Some(self.last_authoritative_tick.map_or(tick, |t| t.max(tick)));
    }

    /// Starts a serve toss for `player`. Only the server, driven on this
    /// peer, may toss while waiting.
    pub fn begin_toss(&mut self, player: PlayerId, ctx: &mut RuleContext) -> bool {
        let allowed = self.rally.is_waiting()
            && !self.rally.toss_in_progress
            && !self.rally.point_ended
            && !self.scoreboard.is_over()
            && player == self.server_player()
            && self.roster.controls(player);
        if !allowed {
            return false;
        }

        let position = self.table.serve_origin(self.rally.server);
        let velocity = Vec3::new(0.0, self.config.toss_speed, 0.0);
        ctx.ball.set_ball_state(&BallState {
            position,
            velocity,
            ..Default::default()
        });

        self.rally.toss_in_progress = true;
        self.bump_authoritative(ctx.tick);
        ctx.outbound.push(NetworkMessage::BallToss {
            position: to_wire(position),
            velocity: to_wire(velocity),
            player_id: player,
            tick: ctx.tick,
        });
        self.events.push(MatchEvent::TossStarted { player });
        log::debug!("player {player} tossed at tick {}", ctx.tick);
        true
    }

    pub fn on_contact(&mut self, contact: Contact, ctx: &mut RuleContext) {
        if self.rally.point_ended {
            log::trace!("ignoring {contact:?} after point end");
            return;
        }
        match contact {
            Contact::Paddle { player, paddle } => self.on_paddle(player, paddle, ctx),
            Contact::Table { side } => self.on_table(side, ctx),
            Contact::Net => {
                if self.is_host() {
                    self.end_point(PointEndReason::Net, ctx);
                }
            }
            Contact::Floor => {
                if self.is_host() {
                    self.end_point(PointEndReason::Floor, ctx);
                }
            }
        }
    }

    fn on_paddle(&mut self, player: PlayerId, paddle: PaddleKinematics, ctx: &mut RuleContext) {
        if !self.roster.controls(player) {
            return;
        }
        let Some(side) = self.roster.side_of(player) else {
            return;
        };

        let serve = match self.rally.phase {
            Phase::WaitingForServe => {
                if side != self.rally.server {
                    log::trace!("player {player} touched the ball out of turn");
                    return;
                }
                true
            }
            Phase::InPlay => {
                if self.rally.last_hitter == Some(side) {
                    log::debug!("ignoring double hit by player {player}");
                    return;
                }
                false
            }
        };

        let ball = ctx.ball.ball_state();
        let input = ShotInput {
            ball: ball.position,
            paddle_position: paddle.position,
            paddle_velocity: paddle.velocity,
            hitter_side: side,
        };
        let shot = if serve {
            self.planner.serve(&input)
        } else {
            self.planner.rally(&input)
        };

        let spin = shot.spin_vector();
        let state = BallState {
            position: ball.position,
            velocity: shot.velocity,
            angular_velocity: spin,
            spin,
            frozen: false,
        };
        ctx.ball.set_ball_state(&state);

        let mut effects = EffectFlags::empty();
        effects.set(EffectFlags::SERVE, serve);
        effects.set(EffectFlags::SPIN, shot.spin != 0.0);
        effects.set(
            EffectFlags::SMASH,
            paddle.velocity.length() >= self.config.smash_speed,
        );
        self.rally.effects = effects;
        self.rally.last_hitter = Some(side);
        self.rally.bounced_since_hit = false;
        self.rally.last_collision_tick = Some(ctx.tick);
        if serve {
            self.rally.toss_in_progress = false;
            self.set_phase(Phase::InPlay);
        }
        self.bump_authoritative(ctx.tick);

        ctx.outbound.push(NetworkMessage::BallHit {
            position: to_wire(state.position),
            velocity: to_wire(state.velocity),
            ang_velocity: to_wire(state.angular_velocity),
            spin: to_wire(state.spin),
            tick: ctx.tick,
            player_id: player,
        });
        self.events.push(MatchEvent::BallHit {
            player,
            tick: ctx.tick,
            velocity: state.velocity,
            serve,
        });
    }

    fn on_table(&mut self, side: Side, ctx: &mut RuleContext) {
        if !self.is_host() {
            return;
        }
        self.events.push(MatchEvent::Bounce {
            side,
            tick: ctx.tick,
        });
        self.rally.last_collision_tick = Some(ctx.tick);

        if self.rally.is_waiting() {
            self.end_point(PointEndReason::PreServeTableContact, ctx);
            return;
        }

        if !self.rally.server_side_has_bounced {
            if side == self.rally.server {
                self.rally.server_side_has_bounced = true;
                self.rally.bounced_since_hit = true;
                self.rally.last_bounce_side = Some(side);
            } else {
                self.end_point(PointEndReason::ServeMissedOwnSide, ctx);
            }
            return;
        }

        if self.rally.last_bounce_side == Some(side) {
            self.end_point(PointEndReason::DoubleBounce { side }, ctx);
        } else if self.rally.last_hitter == Some(side) {
            self.end_point(PointEndReason::BounceOnHitterSide, ctx);
        } else {
            self.rally.bounced_since_hit = true;
            self.rally.last_bounce_side = Some(side);
        }
    }

    fn end_point(&mut self, reason: PointEndReason, ctx: &mut RuleContext) {
        if self.rally.point_ended || !self.is_host() {
            return;
        }
        self.rally.point_ended = true;
        self.rally.toss_in_progress = false;

        let end = self.rally.point_end(reason);
        let winner = end.winner();
        log::info!("point to {winner:?}: {reason:?}");

        ctx.outbound.push(NetworkMessage::BallOut {
            last_bounce_side: end.last_bounce_side,
            server_side_has_bounced: end.server_side_has_bounced,
            bounced_since_hit: end.bounced_since_hit,
            reason,
        });
        self.events.push(MatchEvent::PointEnded(end));

        let won = self.scoreboard.award(winner);
        let scores = self.scoreboard.points();
        ctx.outbound.push(NetworkMessage::ScoreUpdate { scores });
        self.events.push(MatchEvent::ScoreChanged { points: scores });

        if let Some(champion) = won {
            let winner = self.roster.player_on(champion);
            log::info!("match won by player {winner} ({scores:?})");
            self.events.push(MatchEvent::MatchWon { winner });
        }

        self.next_server = self.scoreboard.server();
        let server = self.roster.player_on(self.next_server);
        ctx.outbound.push(NetworkMessage::ServeTurn { player_id: server });
        if self.next_server != self.rally.server {
            self.events.push(MatchEvent::ServeChanged { server });
        }

        self.reset_at = Some(ctx.tick + self.config.reset_delay_ticks);
    }

    /// Per-tick housekeeping. The host resets the rally once the delay
    /// after a point has run out.
    pub fn update(&mut self, ctx: &mut RuleContext) {
        let Some(reset_at) = self.reset_at else {
            return;
        };
        if !self.is_host() || ctx.tick < reset_at {
            return;
        }

        let position = self.table.serve_origin(self.next_server);
        ctx.outbound.push(NetworkMessage::BallReset {
            position: to_wire(position),
            velocity: to_wire(Vec3::ZERO),
            tick: ctx.tick,
        });
        self.reset_rally(self.next_server, position, ctx);
    }

    /// Freezes the ball at `position` and starts a fresh rally served from
    /// `server`.
    pub fn reset_rally(&mut self, server: Side, position: Vec3, ctx: &mut RuleContext) {
        let tick = ctx.tick;
        self.restart_rally(server, position, tick, ctx);
    }

    /// Resets the rally with `authoritative_tick` as the new stale-message
    /// watermark. Inbound resets pass the host's tick, not the local one.
    fn restart_rally(
        &mut self,
        server: Side,
        position: Vec3,
        authoritative_tick: u32,
        ctx: &mut RuleContext,
    ) {
        ctx.ball.freeze_ball(position);
        if let Some(reconciler) = ctx.reconciler.as_deref_mut() {
            reconciler.clear();
        }

        self.next_server = server;
        self.rally = RallyState::new(server, self.roster.controls(self.roster.player_on(server)));
        self.reset_at = None;
        self.last_authoritative_tick = Some(authoritative_tick);

        log::debug!("rally reset at tick {}, {server:?} to serve", ctx.tick);
        self.events.push(MatchEvent::RallyReset);
        self.events.push(MatchEvent::PhaseChanged(Phase::WaitingForServe));
    }

    /// Applies a message from the other peer.
    pub fn on_message(&mut self, message: &NetworkMessage, sender: PlayerId, ctx: &mut RuleContext) {
        if let Some(tick) = message.tick() {
            if self.last_authoritative_tick.is_some_and(|last| tick < last) {
                log::debug!(
                    "dropping stale {} for tick {tick} (last {:?})",
                    message.kind(),
                    self.last_authoritative_tick
                );
                return;
            }
        }

        let from_host = sender == self.roster.host;
        match *message {
            NetworkMessage::BallHit {
                position,
                velocity,
                ang_velocity,
                spin,
                tick,
                player_id,
            } => {
                if self.roster.controls(player_id) || self.rally.point_ended {
                    return;
                }
                let Some(side) = self.roster.side_of(player_id) else {
                    log::warn!("hit from unknown player {player_id}");
                    return;
                };

                let serve = self.rally.is_waiting();
                self.rally.last_hitter = Some(side);
                self.rally.bounced_since_hit = false;
                self.rally.last_collision_tick = Some(tick);
                self.rally.toss_in_progress = false;
                if serve {
                    self.rally.effects = EffectFlags::SERVE;
                    self.set_phase(Phase::InPlay);
                }
                self.bump_authoritative(tick);

                let state = BallState {
                    position: from_wire(position),
                    velocity: from_wire(velocity),
                    angular_velocity: from_wire(ang_velocity),
                    spin: from_wire(spin),
                    frozen: false,
                };
                ctx.accept_ball(&state, tick);
                self.events.push(MatchEvent::BallHit {
                    player: player_id,
                    tick,
                    velocity: state.velocity,
                    serve,
                });
            }
            NetworkMessage::BallToss {
                position,
                velocity,
                player_id,
                tick,
            } => {
                if self.roster.controls(player_id) || !self.rally.is_waiting() {
                    return;
                }
                self.rally.toss_in_progress = true;
                self.bump_authoritative(tick);
                let state = BallState {
                    position: from_wire(position),
                    velocity: from_wire(velocity),
                    ..Default::default()
                };
                ctx.accept_ball(&state, tick);
                self.events.push(MatchEvent::TossStarted { player: player_id });
            }
            NetworkMessage::BallSync {
                position,
                velocity,
                ang_velocity,
                spin,
                tick,
                effects,
            } => {
                if self.is_host() || !from_host || self.rally.point_ended {
                    return;
                }
                // A frozen ball has nothing to correct.
                if self.rally.is_waiting() && !self.rally.toss_in_progress {
                    return;
                }
                self.rally.effects = EffectFlags::from_bits_truncate(effects);
                self.bump_authoritative(tick);
                let state = BallState {
                    position: from_wire(position),
                    velocity: from_wire(velocity),
                    angular_velocity: from_wire(ang_velocity),
                    spin: from_wire(spin),
                    frozen: false,
                };
                ctx.accept_ball(&state, tick);
            }
            NetworkMessage::BallReset { position, tick, .. } => {
                if !self.accept_host_only(message, from_host) {
                    return;
                }
                let position = from_wire(position);
                self.restart_rally(Side::of_z(position.z), position, tick, ctx);
            }
            NetworkMessage::BallOut {
                last_bounce_side,
                server_side_has_bounced,
                bounced_since_hit,
                reason,
            } => {
                if !self.accept_host_only(message, from_host) || self.rally.point_ended {
                    return;
                }
                self.rally.point_ended = true;
                self.rally.toss_in_progress = false;
                self.rally.last_bounce_side = last_bounce_side;
                self.rally.server_side_has_bounced = server_side_has_bounced;
                self.rally.bounced_since_hit = bounced_since_hit;
                let end = PointEnd {
                    reason,
                    server: self.rally.server,
                    last_hitter: self.rally.last_hitter,
                    last_bounce_side,
                    server_side_has_bounced,
                    bounced_since_hit,
                };
                log::info!("host ended the point: {reason:?}");
                self.events.push(MatchEvent::PointEnded(end));
            }
            NetworkMessage::ServeTurn { player_id } => {
                if !self.accept_host_only(message, from_host) {
                    return;
                }
                let Some(side) = self.roster.side_of(player_id) else {
                    return;
                };
                if side != self.next_server {
                    self.events.push(MatchEvent::ServeChanged { server: player_id });
                }
                self.next_server = side;
            }
            NetworkMessage::ScoreUpdate { scores } => {
                if !self.accept_host_only(message, from_host) {
                    return;
                }
                let was_over = self.scoreboard.is_over();
                self.scoreboard.apply(scores);
                self.events.push(MatchEvent::ScoreChanged { points: scores });
                if let (false, Some(side)) = (was_over, self.scoreboard.winner()) {
                    self.events.push(MatchEvent::MatchWon {
                        winner: self.roster.player_on(side),
                    });
                }
            }
            NetworkMessage::PaddleState { .. } => {}
        }
    }

    fn accept_host_only(&self, message: &NetworkMessage, from_host: bool) -> bool {
        if self.is_host() || !from_host {
            log::warn!("ignoring {} from a non-host peer", message.kind());
            return false;
        }
        true
    }
}
