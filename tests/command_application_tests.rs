use futures::FutureExt;
use scenario_engine::builders::Deployment;
use scenario_engine::{
    Address, Arg, BindError, CausalRecord, CommandResolver, CommandShape, EngineError,
    Environment, HandlerError, IndexedData, Outcome, RunState, SimulatedDeployer, Strictness,
    Value, parse_event,
};
use scenario_engine::coerce::AddressCoercer;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const ARGS: [&str; 6] = ["admin", "oracle", "first", "second", "third", "fourth"];

fn base_state() -> RunState {
    RunState::new(
        Environment::new("test", Arc::new(SimulatedDeployer::new(0x1000).rejecting(["Broken"])))
            .with_account("Admin", Address::from_index(1)),
    )
}

/// Six required addresses, deploying `contract`; counts handler invocations.
fn oracle_resolver(contract: &'static str, calls: Arc<AtomicUsize>) -> CommandResolver<Deployment> {
    let args = ARGS.iter().map(|name| Arg::new(*name, AddressCoercer)).collect();
    let shape = CommandShape::new("Deploys an oracle", "Deploy", args, move |state, from, args| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
            state
                .environment()
                .deployer()
                .deploy(contract, &from, args.values())
                .await
                .map(|handle, _| Deployment {
                    index: vec![IndexedData::new(
                        [contract],
                        json!({ "address": handle.address }),
                    )],
                    description: contract.to_string(),
                    handle,
                })
        }
        .boxed()
    })
    .unwrap();

    CommandResolver::with_shapes("Oracle", Strictness::Strict, vec![shape]).unwrap()
}

#[tokio::test]
async fn test_six_addresses_bind_in_order_and_invoke_once() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = oracle_resolver("Oracle", calls.clone());
    let state = base_state();
    let actor = Address::from_index(1);

    let event = parse_event("Deploy Admin 0xAAA 0xBBB 0xCCC 0xDDD 0xEEE")?;
    let applied = state.apply(&actor, &resolver, &event).await?;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let expected: Vec<Value> = std::iter::once(Address::from_index(1))
        .chain(["0xaaa", "0xbbb", "0xccc", "0xddd", "0xeee"].iter().map(|a| Address::parse(a).unwrap()))
        .map(Value::Address)
        .collect();
    assert_eq!(applied.record.arguments, expected);
    assert_eq!(applied.record.actor, actor);
    assert_eq!(applied.state.registry().len(), 1);
    assert!(state.registry().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_five_tokens_fail_on_sixth_declaration() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = oracle_resolver("Oracle", calls.clone());
    let state = base_state();

    let event = parse_event("Deploy Admin 0xAAA 0xBBB 0xCCC 0xDDD")?;
    let err = state
        .apply(&Address::from_index(1), &resolver, &event)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        EngineError::Bind(BindError::MissingArgument {
            declaration: "fourth".into(),
            position: 6,
        })
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(state.registry().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_applying_twice_yields_two_named_entries() -> anyhow::Result<()> {
    let resolver = oracle_resolver("Oracle", Arc::new(AtomicUsize::new(0)));
    let actor = Address::from_index(1);
    let event = parse_event("Deploy Admin 0xAAA 0xBBB 0xCCC 0xDDD 0xEEE")?;

    let first = base_state().apply(&actor, &resolver, &event).await?;
    let second = first.state.apply(&actor, &resolver, &event).await?;

    let registry = second.state.registry();
    assert_eq!(registry.len(), 2);

    let names = registry.names();
    assert_ne!(names[0], names[1]);
    assert_eq!(
        registry.get(names[0]).map(|e| &e.handle.address),
        Some(&first.value.handle.address)
    );
    assert_eq!(
        registry.get(names[1]).map(|e| &e.handle.address),
        Some(&second.value.handle.address)
    );

    assert_eq!(first.record.sequence, 1);
    assert_eq!(second.record.sequence, 2);
    assert_eq!(registry.get(names[1]).map(|e| e.record.sequence), Some(2));

    // The earlier snapshot is unaffected by the second application.
    assert_eq!(first.state.registry().len(), 1);
    assert_eq!(second.state.sequence(), 2);
    assert_eq!(
        second.state.history().collect::<Vec<_>>(),
        vec![
            "Oracle Deploy Admin 0xAAA 0xBBB 0xCCC 0xDDD 0xEEE",
            "Oracle Deploy Admin 0xAAA 0xBBB 0xCCC 0xDDD 0xEEE",
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_handler_failure_leaves_state_identical() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let resolver = oracle_resolver("Broken", calls.clone());
    let state = base_state();
    let before = state.clone();

    let event = parse_event("Deploy Admin 0xAAA 0xBBB 0xCCC 0xDDD 0xEEE")?;
    let err = state
        .apply(&Address::from_index(1), &resolver, &event)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Handler(HandlerError::Rejected { ref contract, .. }) if contract == "Broken"
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(state, before);

    // The rejected call still carries a record of where in the run it failed.
    let actor = Address::from_index(1);
    let advanced = state
        .apply(&actor, &oracle_resolver("Oracle", Arc::new(AtomicUsize::new(0))), &event)
        .await?
        .state;
    let outcome = resolver.dispatch(&advanced, &actor, &event).await?;
    assert!(!outcome.is_success());
    assert_eq!(outcome.record().map(|r| r.sequence), Some(2));
    assert_eq!(outcome.record().map(|r| r.contract.as_str()), Some("Broken"));

    Ok(())
}

#[tokio::test]
async fn test_fold_error_is_reported_without_growth() -> anyhow::Result<()> {
    // Publishing under an empty index path cannot be folded.
    let shape = CommandShape::new("Bad index", "Deploy", vec![], |_state, from, _args| {
        async move {
            Outcome::success(
                Deployment {
                    handle: scenario_engine::Handle::new("Thing", Address::from_index(9)),
                    description: "thing".into(),
                    index: vec![IndexedData::new(Vec::<String>::new(), json!(null))],
                },
                CausalRecord::new("Thing", from, vec![]),
            )
        }
        .boxed()
    })?;
    let resolver = CommandResolver::with_shapes("Thing", Strictness::Strict, vec![shape])?;

    let state = base_state();
    let err = state
        .apply(&Address::from_index(1), &resolver, &parse_event("Deploy")?)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Fold(_)));
    assert!(state.registry().is_empty());
    assert_eq!(state.sequence(), 0);

    Ok(())
}
