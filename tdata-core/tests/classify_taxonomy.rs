use tdata_core::classify::{classify, classify_with_overflow};
use tdata_core::contract::Element;
use tdata_core::summary::Summary;
use tdata_core::taxonomy::{first_match, Category, RULES};

fn elements(texts: &[&str]) -> Vec<Element> {
    texts.iter().map(|t| Element::text(*t)).collect()
}

fn non_empty_categories(summary: &Summary) -> Vec<Category> {
    Category::ALL
        .iter()
        .copied()
        .filter(|c| match c {
            Category::DeviceName => !summary.device_name().is_empty(),
            other => !summary.bucket(*other).is_empty(),
        })
        .collect()
}

#[test]
fn test_end_to_end_register_interrupt_and_unrelated_text() {
    let input = elements(&[
        "Register 0x20: CTRL_REG1 power mode",
        "Interrupt 1 source configuration",
        "Unrelated marketing text",
    ]);

    let summary = classify(&input);

    assert_eq!(
        summary.bucket(Category::Registers),
        ["Register 0x20: CTRL_REG1 power mode"]
    );
    assert_eq!(
        summary.bucket(Category::Interrupts),
        ["Interrupt 1 source configuration"]
    );
    assert_eq!(summary.device_name(), "");
    assert_eq!(
        non_empty_categories(&summary),
        vec![Category::Registers, Category::Interrupts]
    );
}

#[test]
fn test_classify_empty_input_has_every_key_empty() {
    let summary = classify(Vec::<Element>::new());

    assert!(summary.is_empty());
    let json = serde_json::to_value(&summary).unwrap();
    let object = json.as_object().expect("summary serializes as object");
    assert_eq!(Category::ALL.len(), 45);
    assert_eq!(object.len(), Category::ALL.len());
    for category in Category::ALL {
        let value = object.get(category.as_str()).expect("every category key present");
        match category {
            Category::DeviceName => assert_eq!(value, ""),
            _ => assert_eq!(value, &serde_json::json!([])),
        }
    }
}

#[test]
fn test_serialized_keys_follow_taxonomy_order() {
    let json = serde_json::to_string(&Summary::new()).unwrap();
    let mut last = 0;
    for category in Category::ALL {
        let pos = json
            .find(&format!("\"{}\"", category.as_str()))
            .expect("key present");
        assert!(pos >= last, "{category} out of order");
        last = pos;
    }
}

#[test]
fn test_single_trigger_lands_in_exactly_one_bucket() {
    for rule in RULES {
        // Trigger phrases embedded in neutral filler, upper-cased to exercise case folding.
        let text = format!("Section 4: {} OVERVIEW", rule.trigger.to_uppercase());
        let summary = classify(&[Element::text(text.clone())]);
        let hits = non_empty_categories(&summary);
        assert_eq!(hits.len(), 1, "{text} matched {hits:?}");
        // Overlapping triggers resolve to the earliest rule, which may not be this one.
        assert_eq!(Some(hits[0]), first_match(&text));
    }
}

#[test]
fn test_rules_cover_taxonomy_in_order() {
    let categories: Vec<Category> = RULES.iter().map(|r| r.category).collect();
    assert_eq!(categories, Category::ALL);
}

#[test]
fn test_overlapping_triggers_resolve_to_earliest_rule() {
    let summary = classify(&elements(&[
        "Device register map",
        "Memory map and register overview",
        "Hardware interface timing",
        "Power mode and power management",
    ]));

    assert_eq!(
        summary.bucket(Category::Registers),
        ["Device register map", "Memory map and register overview"]
    );
    assert!(summary.bucket(Category::MemoryMap).is_empty());
    assert_eq!(summary.bucket(Category::Interfaces), ["Hardware interface timing"]);
    assert!(summary.bucket(Category::HardwareInterfaces).is_empty());
    assert_eq!(
        summary.bucket(Category::PowerManagement),
        ["Power mode and power management"]
    );
    assert!(summary.bucket(Category::PowerModes).is_empty());
}

#[test]
fn test_device_name_keeps_last_match_and_original_case() {
    let summary = classify(&elements(&[
        "Device Name: AIS328DQ",
        "Device name: LIS3DH",
    ]));

    assert_eq!(summary.device_name(), "Device name: LIS3DH");
}

#[test]
fn test_duplicates_are_kept_in_document_order() {
    let summary = classify(&elements(&[
        "Known issue: FIFO overrun",
        "Known Issue: wake-up latency",
        "Known issue: FIFO overrun",
    ]));

    assert_eq!(
        summary.bucket(Category::KnownIssues),
        [
            "Known issue: FIFO overrun",
            "Known Issue: wake-up latency",
            "Known issue: FIFO overrun"
        ]
    );
}

#[test]
fn test_blank_and_unmatched_elements_are_dropped_but_reported() {
    let input = elements(&["", "   ", "Ordering codes", "Pin configuration (top view)"]);

    let result = classify_with_overflow(&input);

    assert_eq!(
        result.summary.bucket(Category::PinConfiguration),
        ["Pin configuration (top view)"]
    );
    assert_eq!(result.summary.matched_count(), 1);
    assert_eq!(result.unclassified, vec!["Ordering codes".to_string()]);
}

#[test]
fn test_category_hint_is_ignored() {
    let mut table = Element::text("Ordering information");
    table.category_hint = "Table".to_string();
    let mut title = Element::text("Electrical characteristics");
    title.category_hint = "Title".to_string();

    let summary = classify(vec![table, title]);

    assert_eq!(
        non_empty_categories(&summary),
        vec![Category::ElectricalCharacteristics]
    );
}

#[test]
fn test_classification_is_idempotent() {
    let input = elements(&[
        "Register 0x0F WHO_AM_I",
        "Boot sequence after power-on",
        "Change log v2",
        "Marketing",
    ]);

    let first = classify(&input);
    let second = classify(&input);
    assert_eq!(first, second);
}

#[test]
fn test_category_names_round_trip_through_from_str() {
    for category in Category::ALL {
        assert_eq!(category.as_str().parse::<Category>().unwrap(), *category);
    }
    assert!("unclassified".parse::<Category>().is_err());
}
