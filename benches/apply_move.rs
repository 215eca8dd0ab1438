use criterion::{criterion_group, criterion_main, Criterion};
use turnwise::core::SeatId;
use turnwise::def::{ActionClass, ActionDef, CostSpec, GameDef, OperationProfile, TokenTypeDef, VarDef, ZoneDef};
use turnwise::effects::{Effect, SeatRef, ValueExpr, VarScope, ZoneRef};
use turnwise::trace::TraceCollector;
use turnwise::{Engine, Move};

fn bench_def() -> GameDef {
    let mut def = GameDef::new("bench");
    def.globals.push(VarDef::new("pool", 1000).with_range(0, 10_000));
    def.seat_vars
        .push(VarDef::new("resources", 100).with_range(0, 10_000));
    def.zones.push(ZoneDef::new("field"));
    def.token_types.push(TokenTypeDef::new("troop"));

    def.actions.push(
        ActionDef::new("gather", ActionClass::Operation).with_profile(
            OperationProfile::new().with_effect(Effect::add_seat_var("resources", 1)),
        ),
    );
    def.actions.push(
        ActionDef::new("recruit", ActionClass::Operation).with_profile(
            OperationProfile::new()
                .with_cost(CostSpec {
                    scope: VarScope::Seat(SeatRef::Active),
                    var: "resources".into(),
                    amount: ValueExpr::Const(1),
                })
                .with_effect(Effect::CreateToken {
                    token_type: "troop".into(),
                    zone: ZoneRef::Named("field".into()),
                    bind: None,
                    body: vec![],
                }),
        ),
    );
    def
}

fn apply_move_benchmark(c: &mut Criterion) {
    let def = bench_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(7, 4).unwrap();
    let gather = Move::new(SeatId::new(0), "gather");
    let recruit = Move::new(SeatId::new(0), "recruit");

    c.bench_function("apply_move/var_only", |b| {
        b.iter(|| {
            engine
                .apply_move(&state, &gather, &mut TraceCollector::disabled())
                .unwrap()
        })
    });
    c.bench_function("apply_move/cost_plus_token", |b| {
        b.iter(|| {
            engine
                .apply_move(&state, &recruit, &mut TraceCollector::disabled())
                .unwrap()
        })
    });
    c.bench_function("legal_moves", |b| {
        b.iter(|| engine.legal_moves(&state).unwrap())
    });
}

criterion_group!(benches, apply_move_benchmark);
criterion_main!(benches);
