use hydra::agent::td_targets;
use hydra::config::SamplingPolicy;
use hydra::exploration::{ExplorationSchedule, MIN_EPSILON};
use hydra::replay_buffer::{Experience, ReplayBuffer};
use ndarray::{Array1, Array3};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn experience(id: usize, action: usize, reward: Vec<f32>, is_terminal: bool) -> Experience {
    Experience::new(
        Array1::from_elem(2, id as f32),
        action,
        reward,
        Array1::from_elem(2, id as f32 + 1.0),
        is_terminal,
    )
}

/// Heads, batch size and actions of a TD-target problem.
fn layout_strategy() -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..=4, 1usize..=8, 1usize..=5)
}

proptest! {
    #[test]
    fn test_epsilon_stays_in_bounds(
        start in 0.0f32..=1.0,
        rate in 0.01f32..=1.0,
        decay_steps in 1usize..1000,
        step in 0usize..100_000,
    ) {
        let schedule = ExplorationSchedule::new(start, rate, decay_steps);
        let epsilon = schedule.probability(step);
        prop_assert!(epsilon >= MIN_EPSILON);
        prop_assert!(epsilon <= 1.0);
    }

    #[test]
    fn test_epsilon_is_non_increasing(
        start in 0.0f32..=1.0,
        rate in 0.01f32..=1.0,
        decay_steps in 1usize..1000,
        step in 0usize..100_000,
        delta in 0usize..10_000,
    ) {
        let schedule = ExplorationSchedule::new(start, rate, decay_steps);
        prop_assert!(schedule.probability(step + delta) <= schedule.probability(step));
    }

    #[test]
    fn test_buffer_keeps_most_recent(capacity in 1usize..50, inserts in 0usize..200) {
        let mut buffer = ReplayBuffer::new(capacity);
        for id in 0..inserts {
            buffer.add(experience(id, 0, vec![0.0], false));
        }
        prop_assert_eq!(buffer.len(), inserts.min(capacity));

        let kept: Vec<usize> = buffer.iter().map(|e| e.state()[0] as usize).collect();
        let expected: Vec<usize> = (inserts.saturating_sub(capacity)..inserts).collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn test_sample_without_replacement_is_distinct(
        stored in 1usize..60,
        fraction in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let mut buffer = ReplayBuffer::with_policy(64, SamplingPolicy::WithoutReplacement);
        for id in 0..stored {
            buffer.add(experience(id, 0, vec![0.0], false));
        }
        let batch_size = ((stored as f64 * fraction) as usize).max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        let batch = buffer.sample(batch_size, &mut rng).unwrap();

        prop_assert_eq!(batch.len(), batch_size);
        let ids: HashSet<usize> = batch.iter().map(|e| e.state()[0] as usize).collect();
        prop_assert_eq!(ids.len(), batch_size);
    }

    #[test]
    fn test_td_targets_touch_only_taken_actions(
        (heads, batch_len, actions) in layout_strategy(),
        seed in any::<u64>(),
        discount in 0.0f32..=1.0,
    ) {
        use rand::Rng;
        let mut rng = StdRng::seed_from_u64(seed);
        let batch: Vec<Experience> = (0..batch_len)
            .map(|b| {
                let reward = (0..heads).map(|_| rng.gen_range(-1.0..1.0)).collect();
                experience(b, rng.gen_range(0..actions), reward, rng.gen_bool(0.3))
            })
            .collect();
        let refs: Vec<&Experience> = batch.iter().collect();
        let q_values = Array3::from_shape_fn((heads, batch_len, actions), |_| rng.gen_range(-5.0f32..5.0));
        let q_next = Array3::from_shape_fn((heads, batch_len, actions), |_| rng.gen_range(-5.0f32..5.0));

        let targets = td_targets(&refs, q_values.clone(), &q_next, discount).unwrap();
        prop_assert_eq!(targets.dim(), q_values.dim());

        for h in 0..heads {
            for (b, experience) in batch.iter().enumerate() {
                for a in 0..actions {
                    if a != experience.action() {
                        prop_assert_eq!(targets[[h, b, a]], q_values[[h, b, a]]);
                        continue;
                    }
                    let bootstrap = if experience.is_terminal() {
                        0.0
                    } else {
                        q_next.slice(ndarray::s![h, b, ..]).mean().unwrap_or(0.0)
                    };
                    let expected = experience.reward()[h] + discount * bootstrap;
                    prop_assert!((targets[[h, b, a]] - expected).abs() < 1e-4);
                }
            }
        }
    }
}
