//! Tests for CategoryTreeBuilder

use std::collections::HashMap;

use rstest::{fixture, rstest};

use feedcat::domain::{
    build_category_tree, CategoryTree, CategoryTreeBuilder, DomainError, DomainResult,
    RawCategory,
};
use feedcat::util::testing::{init_test_setup, sample_categories};

fn build(categories: Vec<RawCategory>) -> DomainResult<CategoryTree> {
    categories.into_iter().collect::<CategoryTreeBuilder>().build()
}

fn path_of<'a>(tree: &'a CategoryTree, id: &str) -> &'a str {
    tree.get(id).map(|c| c.path.as_str()).unwrap()
}

#[fixture]
fn kids() -> Vec<RawCategory> {
    vec![
        RawCategory::new("1", "", "Kids"),
        RawCategory::new("2", "1", "Girls"),
        RawCategory::new("3", "2", "Dolls"),
    ]
}

#[rstest]
fn given_kids_girls_dolls_when_building_then_paths_are_joined(kids: Vec<RawCategory>) {
    init_test_setup();

    // Act
    let tree = build(kids).unwrap();

    // Assert
    assert_eq!(tree.len(), 3);
    assert_eq!(path_of(&tree, "1"), "Kids");
    assert_eq!(path_of(&tree, "2"), "Kids/Girls");
    assert_eq!(path_of(&tree, "3"), "Kids/Girls/Dolls");
}

#[rstest]
#[case::parents_first(&[0, 1, 2])]
#[case::children_first(&[2, 1, 0])]
#[case::mixed(&[1, 2, 0])]
fn given_any_input_order_when_building_then_same_tree(
    kids: Vec<RawCategory>,
    #[case] order: &[usize],
) {
    let reordered: Vec<RawCategory> = order.iter().map(|&i| kids[i].clone()).collect();

    let expected = build(kids).unwrap();
    let actual = build(reordered).unwrap();

    assert_eq!(actual, expected);
}

#[test]
fn given_five_level_chain_when_building_then_leaf_has_full_path() {
    let tree = build(vec![
        RawCategory::new("5", "4", "Shoes"),
        RawCategory::new("4", "3", "Accessories"),
        RawCategory::new("3", "2", "Dolls"),
        RawCategory::new("2", "1", "Girls"),
        RawCategory::new("1", "", "Kids"),
    ])
    .unwrap();

    assert_eq!(path_of(&tree, "5"), "Kids/Girls/Dolls/Accessories/Shoes");
    assert_eq!(tree.depth("5").unwrap(), 5);
}

#[test]
fn given_sample_forest_when_building_then_roots_and_children_are_sorted() {
    let tree = build(sample_categories()).unwrap();

    let roots: Vec<&str> = tree.roots().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(roots, vec!["Home", "Kids"]);

    let children: Vec<&str> = tree.children("20").iter().map(|c| c.id.as_str()).collect();
    assert_eq!(children, vec!["21"]);
    assert!(tree.children("24").is_empty());

    let paths: Vec<&str> = tree.sorted_by_path().iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths.first(), Some(&"Home"));
    assert_eq!(paths.last(), Some(&"Kids/Girls/Dolls"));
}

#[test]
fn given_parent_outside_input_when_building_then_category_is_root() {
    let tree = build(vec![
        RawCategory::new("7", "999", "Orphans"),
        RawCategory::new("8", "7", "Socks"),
    ])
    .unwrap();

    assert_eq!(path_of(&tree, "7"), "Orphans");
    assert_eq!(path_of(&tree, "8"), "Orphans/Socks");
    assert_eq!(tree.roots().len(), 1);
}

#[test]
fn given_two_node_cycle_when_building_then_cycle_detected() {
    let result = build(vec![
        RawCategory::new("A", "B", "Alpha"),
        RawCategory::new("B", "A", "Beta"),
    ]);

    assert!(matches!(result, Err(DomainError::CycleDetected { .. })));
}

#[test]
fn given_chain_leading_into_cycle_when_building_then_cycle_detected() {
    // "tail" is not itself part of the loop
    let result = build(vec![
        RawCategory::new("tail", "x", "Tail"),
        RawCategory::new("x", "y", "X"),
        RawCategory::new("y", "z", "Y"),
        RawCategory::new("z", "x", "Z"),
        RawCategory::new("ok", "", "Fine"),
    ]);

    match result {
        Err(DomainError::CycleDetected { repeated, .. }) => {
            assert!(["x", "y", "z"].contains(&repeated.as_str()));
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn given_self_parent_when_building_then_cycle_names_itself() {
    let result = build(vec![RawCategory::new("s", "s", "Self")]);

    assert_eq!(
        result.unwrap_err(),
        DomainError::CycleDetected {
            id: "s".into(),
            repeated: "s".into(),
        }
    );
}

#[test]
fn given_mapping_input_when_building_then_matches_builder() {
    let raw: HashMap<String, RawCategory> = sample_categories()
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();

    let from_map = build_category_tree(&raw).unwrap();
    let from_builder = build(sample_categories()).unwrap();

    assert_eq!(from_map, from_builder);
    assert_eq!(path_of(&from_map, "24"), "Home/Lighting/Lamps/Wall/Sconces");
}

#[test]
fn given_empty_mapping_when_building_then_empty_tree() {
    let tree = build_category_tree(&HashMap::new()).unwrap();
    assert!(tree.is_empty());
    assert!(tree.roots().is_empty());
}
