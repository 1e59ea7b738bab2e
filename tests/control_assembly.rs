//! Control assembly: fixed scenarios plus purity properties

use kedao::controls::{assemble, builtin_controls, Control, ControlType};
use proptest::prelude::*;
use rstest::rstest;

fn strings(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| key.to_string()).collect()
}

fn keys(controls: &[Control]) -> Vec<String> {
    controls.iter().map(|control| control.key.clone()).collect()
}

fn extension_controls() -> Vec<Control> {
    vec![
        Control::new("EMOTICON", ControlType::Dropdown),
        Control::new("save", ControlType::Button).with_command("save"),
        Control::new("bold", ControlType::Button).with_title("Not the builtin"),
    ]
}

#[rstest]
#[case(&["bold", "EMOTICON"], &["EMOTICON"], &["bold"])]
#[case(&["bold", "EMOTICON"], &[], &["bold", "EMOTICON"])]
#[case(&["save", "separator", "undo"], &["undo"], &["save", "separator"])]
#[case(&["missing", "italic"], &[], &["italic"])]
#[case(&[], &["bold"], &[])]
fn assembles_in_include_order(#[case] include: &[&str], #[case] exclude: &[&str], #[case] expected: &[&str]) {
    let assembled = assemble(
        &builtin_controls(),
        &extension_controls(),
        &strings(include),
        &strings(exclude),
    );
    assert_eq!(keys(&assembled), strings(expected));
}

#[test]
fn builtin_keeps_its_key() {
    let assembled = assemble(&builtin_controls(), &extension_controls(), &strings(&["bold"]), &[]);
    assert_eq!(assembled[0].title, "Bold");
    assert_eq!(assembled[0].control_type, ControlType::InlineStyle);
}

fn known_key() -> impl Strategy<Value = String> {
    let mut pool = keys(&builtin_controls());
    pool.extend(keys(&extension_controls()));
    pool.push("separator".to_string());
    pool.push("nonexistent".to_string());
    prop::sample::select(pool)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn assembly_is_deterministic(
        include in prop::collection::vec(known_key(), 0..12),
        exclude in prop::collection::vec(known_key(), 0..4),
    ) {
        let first = assemble(&builtin_controls(), &extension_controls(), &include, &exclude);
        let second = assemble(&builtin_controls(), &extension_controls(), &include, &exclude);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn excluding_keys_not_included_is_a_no_op(
        include in prop::collection::vec(known_key(), 0..12),
        extra in prop::collection::vec(known_key(), 0..4),
    ) {
        let exclude: Vec<String> = extra.into_iter().filter(|key| !include.contains(key)).collect();
        let plain = assemble(&builtin_controls(), &extension_controls(), &include, &[]);
        let filtered = assemble(&builtin_controls(), &extension_controls(), &include, &exclude);
        prop_assert_eq!(plain, filtered);
    }

    #[test]
    fn keys_are_unique_apart_from_separators(include in prop::collection::vec(known_key(), 0..16)) {
        let assembled = assemble(&builtin_controls(), &extension_controls(), &include, &[]);
        let mut seen = std::collections::HashSet::new();
        for control in assembled.iter().filter(|control| control.key != "separator") {
            prop_assert!(seen.insert(control.key.clone()), "duplicate key {}", control.key);
        }
    }
}
