//! Shared game definitions for the integration suites.
#![allow(dead_code)]

use turnwise::core::SeatId;
use turnwise::def::{
    ActionClass, ActionDef, CardDrivenDef, CardLifecycleDef, CostSpec, EligibilityWindow,
    GameDef, MarkerDef, MonsoonDef, OperationProfile, OptionMatrixRow, ParamCap, ParamKind,
    PassReward, PivotalDef, ResultSpec, TerminalRule, TokenTypeDef, TurnOrderDef, VarDef, ZoneDef,
};
use turnwise::effects::{
    ChoiceOptions, CmpOp, Condition, Effect, SeatRef, ValueExpr, VarScope, ZoneRef,
};
use turnwise::trace::TraceCollector;
use turnwise::{Engine, GameState, Move};

/// A small two-seat round-robin game: a shared pool, per-seat
/// resources, a recruiting cost, a ranged choice, and a die roll.
pub fn skirmish_def() -> GameDef {
    let mut def = GameDef::new("skirmish");
    def.globals.push(VarDef::new("pool", 10).with_range(0, 50));
    def.seat_vars
        .push(VarDef::new("resources", 5).with_range(0, 20));
    def.zones.push(ZoneDef::new("field"));
    def.token_types
        .push(TokenTypeDef::new("troop").with_prop("strength", 1));

    def.actions.push(
        ActionDef::new("gather", ActionClass::Operation).with_profile(
            OperationProfile::new().with_effect(Effect::add_seat_var("resources", 2)),
        ),
    );
    def.actions.push(
        ActionDef::new("recruit", ActionClass::Operation).with_profile(
            OperationProfile::new()
                .with_cost(CostSpec {
                    scope: VarScope::Seat(SeatRef::Active),
                    var: "resources".into(),
                    amount: ValueExpr::Const(3),
                })
                .with_effect(Effect::CreateToken {
                    token_type: "troop".into(),
                    zone: ZoneRef::Named("field".into()),
                    bind: None,
                    body: vec![],
                }),
        ),
    );
    def.actions.push(
        ActionDef::new("pick", ActionClass::Operation).with_profile(
            OperationProfile::new().with_effect(Effect::ChooseOne {
                choice: "bonus".into(),
                chooser: SeatRef::Active,
                options: ChoiceOptions::Range {
                    min: ValueExpr::Const(1),
                    max: ValueExpr::Const(3),
                },
                bind: "n".into(),
                body: vec![Effect::AddVar {
                    scope: VarScope::Seat(SeatRef::Active),
                    var: "resources".into(),
                    delta: ValueExpr::Binding("n".into()),
                }],
            }),
        ),
    );
    def.actions.push(
        ActionDef::new("raid", ActionClass::Operation).with_profile(
            OperationProfile::new().with_effect(Effect::Roll {
                bind: "r".into(),
                min: ValueExpr::Const(0),
                max: ValueExpr::Const(3),
                body: vec![Effect::AddVar {
                    scope: VarScope::Seat(SeatRef::Active),
                    var: "resources".into(),
                    delta: ValueExpr::Binding("r".into()),
                }],
            }),
        ),
    );
    def.actions.push(ActionDef::new("idle", ActionClass::Pass));

    def.terminal.push(TerminalRule {
        condition: Condition::Compare {
            op: CmpOp::Le,
            left: ValueExpr::var("pool"),
            right: ValueExpr::Const(0),
        },
        result: ResultSpec::WinnerByVar {
            var: "resources".into(),
            highest: true,
        },
    });
    def
}

/// The skirmish game under simultaneous submission.
pub fn simultaneous_def() -> GameDef {
    let mut def = skirmish_def();
    def.turn_order = TurnOrderDef::Simultaneous;
    def
}

fn spawn(token_type: &str, zone: &str) -> Effect {
    Effect::CreateToken {
        token_type: token_type.into(),
        zone: ZoneRef::Named(zone.into()),
        bind: None,
        body: vec![],
    }
}

/// A four-seat card-driven game with an option matrix, pass rewards,
/// monsoon restrictions, pivotal interrupts, and eligibility effects.
///
/// The played slot starts with a coup card when `coup_up` is true,
/// otherwise an ordinary event card. Lookahead holds one card and the
/// deck two more.
pub fn insurgency_def(coup_up: bool) -> GameDef {
    let mut def = GameDef::new("insurgency");
    def.seat_vars
        .push(VarDef::new("resources", 2).with_range(0, 10));
    def.globals.push(VarDef::new("defiance", 0).with_range(0, 1));
    def.markers
        .push(MarkerDef::new("season", ["dry", "monsoon"], "dry"));
    for zone in ["deck", "lookahead", "played", "leader"] {
        def.zones.push(ZoneDef::new(zone).queue());
    }
    def.token_types.push(TokenTypeDef::new("event_card"));
    def.token_types.push(TokenTypeDef::new("coup_card"));

    def.actions
        .push(ActionDef::new("event", ActionClass::Event));
    def.actions.push(
        ActionDef::new("operate", ActionClass::Operation).with_profile(
            OperationProfile::new().with_effect(Effect::add_seat_var("resources", 1)),
        ),
    );
    def.actions.push(
        ActionDef::new("special", ActionClass::OperationPlusSpecialActivity).with_profile(
            OperationProfile::new().with_effect(Effect::add_seat_var("resources", 1)),
        ),
    );
    let mut limited = ActionDef::new("limited_strike", ActionClass::LimitedOperation)
        .with_param("count", ParamKind::Scalar);
    limited.limited_param_cap = Some(("count".into(), 2));
    def.actions.push(limited);
    def.actions.push(ActionDef::new("pass", ActionClass::Pass));

    let mut uprising = ActionDef::new("uprising", ActionClass::Pivotal);
    uprising.pivotal = Some(PivotalDef {
        precondition: Condition::Always,
        cancelled_by: vec!["counter".into()],
    });
    def.actions.push(uprising);
    let mut counter = ActionDef::new("counter", ActionClass::Pivotal);
    counter.pivotal = Some(PivotalDef {
        precondition: Condition::Always,
        cancelled_by: vec![],
    });
    def.actions.push(counter);

    def.actions.push(
        ActionDef::new("exclude_now", ActionClass::Operation).with_profile(
            OperationProfile::new().with_effect(Effect::SetEligibility {
                seat: SeatRef::Seat(SeatId::new(2)),
                eligible: false,
                window: EligibilityWindow::ThisCard,
            }),
        ),
    );
    def.actions.push(
        ActionDef::new("exclude_next", ActionClass::Operation).with_profile(
            OperationProfile::new().with_effect(Effect::SetEligibility {
                seat: SeatRef::Seat(SeatId::new(3)),
                eligible: false,
                window: EligibilityWindow::NextCard,
            }),
        ),
    );
    def.actions.push(
        ActionDef::new("exclude_round", ActionClass::Operation).with_profile(
            OperationProfile::new().with_effect(Effect::SetEligibility {
                seat: SeatRef::Seat(SeatId::new(2)),
                eligible: false,
                window: EligibilityWindow::ThisRound,
            }),
        ),
    );
    def.actions.push(
        ActionDef::new("grant_free", ActionClass::Operation).with_profile(
            OperationProfile::new().with_effect(Effect::GrantFreeOperation {
                seat: SeatRef::Seat(SeatId::new(3)),
            }),
        ),
    );

    def.turn_order = TurnOrderDef::CardDriven(CardDrivenDef {
        seat_order: SeatId::all(4).collect(),
        option_matrix: vec![
            OptionMatrixRow::new(ActionClass::Event, vec![ActionClass::Operation]),
            OptionMatrixRow::new(
                ActionClass::Operation,
                vec![
                    ActionClass::Operation,
                    ActionClass::OperationPlusSpecialActivity,
                ],
            ),
            OptionMatrixRow::new(
                ActionClass::OperationPlusSpecialActivity,
                vec![ActionClass::Operation],
            ),
        ],
        pass_rewards: vec![PassReward::for_all("resources", 1)],
        lifecycle: CardLifecycleDef {
            deck: "deck".into(),
            lookahead: "lookahead".into(),
            played: "played".into(),
            leader: "leader".into(),
            coup_type: "coup_card".into(),
        },
        monsoon: Some(MonsoonDef {
            marker: "season".into(),
            state: "monsoon".into(),
            forbidden_actions: vec!["operate".into()],
            param_caps: vec![ParamCap {
                action: "limited_strike".into(),
                param: "count".into(),
                max: 1,
            }],
            block_pivotal: true,
            override_var: Some("defiance".into()),
        }),
    });

    def.setup.push(spawn(
        if coup_up { "coup_card" } else { "event_card" },
        "played",
    ));
    def.setup.push(spawn("event_card", "lookahead"));
    def.setup.push(spawn("event_card", "deck"));
    def.setup.push(spawn("event_card", "deck"));
    def
}

/// Apply a move that is expected to be legal.
pub fn apply(engine: &Engine, state: &GameState, mv: &Move) -> GameState {
    engine
        .apply_move(state, mv, &mut TraceCollector::disabled())
        .expect("move should apply")
}
