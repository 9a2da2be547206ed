use calcdag::compiler::{CompiledExpression, OperandRef, Operation, compile};
use calcdag::dag::{Operand, Scheduler, TaskGraphBuilder};
use calcdag::errors::ErrorKind;
use calcdag::types::Operator;

#[test]
fn builds_tasks_with_forward_references_and_explicit_root() {
    let mut next_id = 10;
    let built = TaskGraphBuilder::new(1, &mut next_id)
        .build(&compile("2+3*4").unwrap())
        .unwrap();

    assert_eq!(built.tasks.len(), 2);
    assert_eq!(built.tasks[0].id, 10);
    assert_eq!(built.tasks[0].operator, Operator::Mul);
    assert_eq!(built.tasks[0].arg1, Operand::Literal(3.0));
    assert_eq!(built.tasks[0].arg2, Operand::Literal(4.0));

    assert_eq!(built.tasks[1].id, 11);
    assert_eq!(built.tasks[1].operator, Operator::Add);
    assert_eq!(built.tasks[1].arg1, Operand::Literal(2.0));
    assert_eq!(built.tasks[1].arg2, Operand::PendingRef(10));

    assert_eq!(built.root_task_id(), 11);
    assert_eq!(next_id, 12);
}

#[test]
fn graph_tracks_dependencies_and_dependents() {
    let mut next_id = 1;
    let built = TaskGraphBuilder::new(3, &mut next_id)
        .build(&compile("(1+2)*(3+4) - 5").unwrap())
        .unwrap();
    let graph = &built.graph;

    // t1 = 1+2, t2 = 3+4, t3 = t1*t2, t4 = t3-5
    assert_eq!(graph.tasks(), &[1, 2, 3, 4]);
    assert_eq!(graph.root_task_id(), 4);

    let mut deps = graph.dependencies_of(3);
    deps.sort_unstable();
    assert_eq!(deps, vec![1, 2]);
    assert_eq!(graph.dependents_of(1), vec![3]);

    let mut downstream = graph.transitive_dependents(2);
    downstream.sort_unstable();
    assert_eq!(downstream, vec![3, 4]);
    assert!(graph.transitive_dependents(4).is_empty());

    graph.validate().unwrap();
}

#[test]
fn forward_reference_to_unbuilt_operation_is_internal_error() {
    let compiled = CompiledExpression {
        operations: vec![
            Operation {
                operator: Operator::Add,
                left: OperandRef::Literal(1.0),
                right: OperandRef::Output(2),
            },
            Operation {
                operator: Operator::Add,
                left: OperandRef::Literal(1.0),
                right: OperandRef::Literal(1.0),
            },
        ],
        output: OperandRef::Output(2),
    };

    let mut next_id = 5;
    let err = TaskGraphBuilder::new(1, &mut next_id).build(&compiled).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(next_id, 5, "failed build must not consume ids");
}

#[test]
fn literal_only_compilation_cannot_be_built() {
    let mut next_id = 1;
    let err = TaskGraphBuilder::new(1, &mut next_id)
        .build(&compile("42").unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn task_ids_are_unique_across_expressions() {
    let mut scheduler = Scheduler::new();
    let first = scheduler.builder_for(1).build(&compile("1+2+3").unwrap()).unwrap();
    let second = scheduler.builder_for(2).build(&compile("4*5").unwrap()).unwrap();

    let first_ids: Vec<_> = first.tasks.iter().map(|t| t.id).collect();
    let second_ids: Vec<_> = second.tasks.iter().map(|t| t.id).collect();
    assert_eq!(first_ids, vec![1, 2]);
    assert_eq!(second_ids, vec![3]);
    assert!(second.tasks.iter().all(|t| t.expression_id == 2));
}
