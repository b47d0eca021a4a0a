/*
 *  SPDX-License-Identifier: Apache-2.0 OR MIT
 *  © 2020-2022 ETH Zurich and other contributors, see AUTHORS.txt for details
 */

use scenario_outpost::*;
use serde_json::json;

fn duel(distance: f32, ticks: u64) -> Config {
    Config::from_json(json!({
        "ticks": ticks,
        "engine": { "seed": 42 },
        "agents": [
            { "behavior": "grunt", "position": [0.0, 0.0, 0.0], "facing": [1.0, 0.0, 0.0] },
            { "behavior": "hound", "position": [distance, 0.0, 0.0], "facing": [-1.0, 0.0, 0.0] }
        ]
    }))
    .unwrap()
}

#[test]
fn same_seed_same_battle() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = duel(300., 200);
    let first = serde_json::to_value(simulate(&config, 0).unwrap()).unwrap();
    let second = serde_json::to_value(simulate(&config, 0).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn runs_of_a_batch_use_successive_seeds() {
    let config = duel(300., 5);
    assert_eq!(simulate(&config, 0).unwrap().seed, Some(42));
    assert_eq!(simulate(&config, 3).unwrap().seed, Some(45));
}

#[test]
fn foes_notice_each_other() {
    let report = simulate(&duel(300., 30), 0).unwrap();
    assert!(report.schedules.contains_key("grunt-found-enemy"));
    assert!(report.schedules.contains_key("hound-howl"));
    assert_eq!(report.sides["grunt"].spawned, 1);
    assert_eq!(report.sides["hound"].spawned, 1);
}

#[test]
fn hound_within_reach_bites() {
    let report = simulate(&duel(40., 100), 0).unwrap();
    assert!(report.sides["hound"].damage_dealt > 0.);
    assert!(report.sides["grunt"].damage_taken > 0.);
}

#[test]
fn battle_ends_once_decided() {
    let report = simulate(&duel(40., 5000), 0).unwrap();
    if report.winner.is_some() {
        assert!(report.ticks < 5000);
        assert_eq!(report.kills.len(), 1);
    } else {
        assert_eq!(report.ticks, 5000);
    }
}

#[test]
fn unknown_behavior_is_rejected() {
    let config = Config::from_json(json!({
        "agents": [{ "behavior": "headcrab", "position": [0.0, 0.0, 0.0] }]
    }))
    .unwrap();
    assert!(matches!(
        simulate(&config, 0),
        Err(ScenarioError::UnknownBehavior(name)) if name == "headcrab"
    ));
}

#[test]
fn shipped_configs_load() {
    for name in ["skirmish.json", "guard.json"] {
        let path = format!("{}/configs/{}", env!("CARGO_MANIFEST_DIR"), name);
        let config = Config::load(&path, ["ticks=3"]).unwrap();
        assert_eq!(config.ticks, 3);
        let report = simulate(&config, 0).unwrap();
        assert!(report.ticks <= 3);
    }
}
