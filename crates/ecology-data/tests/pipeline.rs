//! End-to-end checks: raw records through normalization, assembly,
//! persistence, explosion and aggregation.

use ecology_core::models::RawRecord;
use ecology_data::aggregator::AggregationEngine;
use ecology_data::analysis::{analyze_dataset, AnalysisOptions};
use ecology_data::assembler::DatasetAssembler;
use ecology_data::store::{load_dataset, save_dataset};
use serde_json::json;
use tempfile::TempDir;

fn two_records() -> Vec<RawRecord> {
    vec![
        json!({
            "name": "Wyvern Hatchling",
            "type": "dragon",
            "speed": {"walk": "30 ft.", "fly": "60 ft."},
            "environments": ["Forest", "Hill"],
            "damage_resistances": "fire",
            "challenge_rating": "2"
        }),
        json!({
            "name": "Cave Slug",
            "speed": "20 ft.",
            "environments": [],
            "damage_resistances": null
        }),
    ]
}

fn paged_bestiary() -> Vec<Vec<RawRecord>> {
    vec![
        vec![
            json!({
                "name": "Sahuagin", "type": "humanoid", "size": "Medium",
                "environments": "Coastal, Underwater",
                "challenge_rating": "1/2", "hit_points": 22, "armor_class": 12,
                "speed": "30 ft., swim 40 ft.",
                "damage_resistances": "", "senses": "darkvision 120 ft."
            }),
            json!({
                "name": "Bulette", "type": "monstrosity", "size": "Large",
                "environments": ["Grassland", "Hill"],
                "challenge_rating": 5, "hit_points": 94, "armor_class": 17,
                "speed": {"walk": "40 ft.", "burrow": "40 ft."},
                "senses": {"darkvision": "60 ft.", "tremorsense": "60 ft."}
            }),
        ],
        vec![json!({
            "name": "Fire Elemental", "type": "elemental", "size": "Large",
            "environments": ["Desert"],
            "challenge_rating": "5", "hit_points": "102",
            "speed": "50 ft.",
            "damage_resistances": "bludgeoning, piercing, and slashing from nonmagical attacks",
            "damage_immunities": ["fire", "poison"],
            "senses": "darkvision 60 ft., passive Perception 10"
        })],
    ]
}

#[test]
fn test_two_record_scenario() {
    let mut assembler = DatasetAssembler::new();
    assembler.add_records(&two_records());
    let dataset = assembler.finalize();
    assert_eq!(dataset.len(), 2);

    let second = &dataset.rows()[1];
    assert_eq!(second.speed.walk, 20);
    assert_eq!(second.damage_resistances, "");
    assert!(second.environment.is_empty());

    let exploded = dataset.explode();
    assert_eq!(exploded.len(), 2);
    assert!(exploded.iter().all(|e| e.row.name == "Wyvern Hatchling"));

    let engine = AggregationEngine::new(&exploded);
    let table = engine.damage_adaptation_pct(&["fire"], 2).unwrap();
    assert_eq!(table.keys(), vec!["Forest", "Hill"]);
    assert_eq!(table.get("Forest", "fire"), Some(100.0));
    assert_eq!(table.get("Hill", "fire"), Some(100.0));
}

#[test]
fn test_paged_assembly_and_report() {
    let mut assembler = DatasetAssembler::new();
    for page in paged_bestiary() {
        assembler.add_records(&page);
    }
    let dataset = assembler.finalize();
    assert_eq!(dataset.len(), 3);

    let elemental = &dataset.rows()[2];
    assert_eq!(elemental.hp, Some(102));
    assert_eq!(elemental.resist_count, 3);
    assert_eq!(elemental.immune_count, 2);

    let bulette = &dataset.rows()[1];
    assert_eq!(bulette.speed.burrow, 40);
    assert!(bulette.tremorsense);

    let report = analyze_dataset(&dataset, &AnalysisOptions::default());
    assert_eq!(report.metadata.exploded_rows, 5);

    let counts = report.environment_counts.as_ref().unwrap();
    let total: f64 = counts.rows.iter().filter_map(|r| r.values[0]).sum();
    assert_eq!(total, 5.0);

    let movement = report.movement_adaptation.as_ref().unwrap();
    assert_eq!(movement.get("Underwater", "Swim"), Some(100.0));
    assert_eq!(movement.get("Grassland", "Burrow"), Some(100.0));

    let damage = report.damage_adaptation.as_ref().unwrap();
    assert_eq!(damage.get("Desert", "fire"), Some(100.0));
    assert_eq!(damage.get("Coastal", "fire"), Some(0.0));
    for row in report.tables().iter().filter(|t| t.title.ends_with("(%)")).flat_map(|t| &t.rows) {
        for v in row.values.iter().flatten() {
            assert!((0.0..=100.0).contains(v));
        }
    }
}

#[test]
fn test_persisted_dataset_reproduces_report() {
    let mut assembler = DatasetAssembler::new();
    for page in paged_bestiary() {
        assembler.add_records(&page);
    }
    let dataset = assembler.finalize();

    let dir = TempDir::new().unwrap();
    for name in ["monsters_ecology.json", "monsters_ecology.csv"] {
        let path = dir.path().join(name);
        save_dataset(dataset.rows(), &path).unwrap();
        let reloaded = load_dataset(&path).unwrap();
        assert_eq!(reloaded, dataset);

        let before = analyze_dataset(&dataset, &AnalysisOptions::default());
        let after = analyze_dataset(&reloaded, &AnalysisOptions::default());
        assert_eq!(before.tables(), after.tables());
    }
}
