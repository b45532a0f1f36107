use lumen_ngin::postprocess::{ChainPlan, Slot};

#[test]
fn empty_chain_renders_the_scene_straight_to_the_output() {
    let plan = ChainPlan::new(0);

    assert_eq!(plan.scene, Slot::Output);
    assert!(plan.steps.is_empty());
    assert_eq!(plan.ping_pong_count(), 0);
}

#[test]
fn single_effect_needs_one_intermediate_target() {
    let plan = ChainPlan::new(1);

    assert_eq!(plan.scene, Slot::PingPong(0));
    assert_eq!(plan.steps, vec![(Slot::PingPong(0), Slot::Output)]);
    assert_eq!(plan.ping_pong_count(), 1);
}

#[test]
fn two_effects_keep_the_scene_target_intact() {
    let plan = ChainPlan::new(2);

    assert_eq!(
        plan.steps,
        vec![
            (Slot::PingPong(0), Slot::PingPong(1)),
            (Slot::PingPong(1), Slot::Output),
        ]
    );
    assert_eq!(plan.ping_pong_count(), 2);
}

#[test]
fn longer_chains_alternate_between_two_effect_targets() {
    let plan = ChainPlan::new(4);

    assert_eq!(plan.scene, Slot::PingPong(0));
    assert_eq!(
        plan.steps,
        vec![
            (Slot::PingPong(0), Slot::PingPong(1)),
            (Slot::PingPong(1), Slot::PingPong(2)),
            (Slot::PingPong(2), Slot::PingPong(1)),
            (Slot::PingPong(1), Slot::Output),
        ]
    );
    assert_eq!(plan.ping_pong_count(), 3);
}

#[test]
fn every_step_reads_what_the_previous_one_wrote() {
    for n in 1..8 {
        let plan = ChainPlan::new(n);
        let mut last = plan.scene;
        for &(input, output) in &plan.steps {
            assert_eq!(input, last);
            assert_ne!(input, output);
            assert_ne!(output, plan.scene, "chain of {n} overwrites the scene");
            last = output;
        }
        assert_eq!(last, Slot::Output);
        assert!(plan.ping_pong_count() <= 3);
    }
}
