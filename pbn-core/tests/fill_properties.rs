use pbn_core::{Click, ColorGroup, FillState, RegionMap, RegionStatus, Rgb, ShapeId};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Action {
    Select(usize),
    Click(usize, usize),
    FillAll,
    ClearAll,
}

fn build_map(sizes: &[usize]) -> RegionMap {
    let groups = sizes
        .iter()
        .enumerate()
        .map(|(gi, &n)| ColorGroup {
            color: Rgb(gi as u8, 255 - gi as u8, 7),
            shapes: (0..n).map(|si| ShapeId::new(format!("g{gi}s{si}"))).collect(),
        })
        .collect();
    RegionMap::new(groups).unwrap()
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => (0usize..8).prop_map(Action::Select),
        8 => (0usize..8, 0usize..8).prop_map(|(g, s)| Action::Click(g, s)),
        1 => Just(Action::FillAll),
        1 => Just(Action::ClearAll),
    ]
}

fn color(gi: usize) -> Rgb {
    Rgb(gi as u8, 255 - gi as u8, 7)
}

fn shape(gi: usize, si: usize) -> ShapeId {
    ShapeId::new(format!("g{gi}s{si}"))
}

fn apply(fs: &mut FillState, a: &Action) {
    match *a {
        Action::Select(g) => {
            fs.select_color(color(g));
        }
        Action::Click(g, s) => {
            fs.click_region(&shape(g, s));
        }
        Action::FillAll => {
            fs.fill_all();
        }
        Action::ClearAll => {
            fs.clear_all();
        }
    }
}

fn check_invariants(fs: &FillState) -> Result<(), TestCaseError> {
    for (gi, group) in fs.region_map().groups().iter().enumerate() {
        let open = group
            .shapes
            .iter()
            .filter(|s| fs.status(s) != Some(RegionStatus::Filled))
            .count();
        if gi == 0 {
            prop_assert_eq!(fs.remaining(group.color), None);
        } else {
            prop_assert_eq!(fs.remaining(group.color), Some(open));
        }
        for s in &group.shapes {
            let st = fs.status(s).unwrap();
            let should_highlight = gi > 0 && fs.selected() == Some(group.color);
            if st != RegionStatus::Filled {
                prop_assert_eq!(st == RegionStatus::Highlighted, should_highlight);
            }
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn init_tracks_every_palette_shape(sizes in prop::collection::vec(0usize..8, 1..8)) {
        let fs = FillState::new(build_map(&sizes));
        let expected: usize = sizes.iter().skip(1).sum();
        prop_assert_eq!(fs.total_remaining(), expected);
        check_invariants(&fs)?;
    }

    #[test]
    fn invariants_hold_after_any_history(
        sizes in prop::collection::vec(0usize..8, 1..8),
        actions in prop::collection::vec(action(), 0..40),
    ) {
        let mut fs = FillState::new(build_map(&sizes));
        for a in &actions {
            apply(&mut fs, a);
            check_invariants(&fs)?;
        }
    }

    #[test]
    fn click_fills_exactly_one_highlighted_region(
        sizes in prop::collection::vec(0usize..8, 1..8),
        history in prop::collection::vec(action(), 0..30),
        target in (0usize..8, 0usize..8),
    ) {
        let mut fs = FillState::new(build_map(&sizes));
        for a in &history {
            apply(&mut fs, a);
        }
        let id = shape(target.0, target.1);
        let before = fs.clone();
        let outcome = fs.click_region(&id);
        if before.status(&id) == Some(RegionStatus::Highlighted) {
            let c = color(target.0);
            let was = before.remaining(c).unwrap();
            prop_assert!(was >= 1);
            prop_assert_eq!(fs.remaining(c), Some(was - 1));
            prop_assert_eq!(fs.status(&id), Some(RegionStatus::Filled));
            prop_assert_eq!(
                outcome,
                Click::Filled { color: c, remaining: was - 1, completed: was == 1 }
            );
        } else {
            prop_assert_eq!(outcome, Click::Ignored);
            prop_assert_eq!(&fs, &before);
        }
    }

    #[test]
    fn fill_all_completes_every_color(
        sizes in prop::collection::vec(0usize..8, 1..8),
        history in prop::collection::vec(action(), 0..30),
    ) {
        let mut fs = FillState::new(build_map(&sizes));
        for a in &history {
            apply(&mut fs, a);
        }
        fs.fill_all();
        for c in fs.remaining_counts().keys() {
            prop_assert!(fs.is_color_complete(*c));
        }
        prop_assert!(fs.is_complete());
    }

    #[test]
    fn clear_all_restores_group_sizes(
        sizes in prop::collection::vec(0usize..8, 1..8),
        history in prop::collection::vec(action(), 0..30),
    ) {
        let mut fs = FillState::new(build_map(&sizes));
        for a in &history {
            apply(&mut fs, a);
        }
        fs.clear_all();
        for (gi, n) in sizes.iter().enumerate().skip(1) {
            prop_assert_eq!(fs.remaining(color(gi)), Some(*n));
        }
        prop_assert_eq!(&fs, &FillState::new(build_map(&sizes)));
    }

    #[test]
    fn select_color_is_idempotent(
        sizes in prop::collection::vec(0usize..8, 1..8),
        history in prop::collection::vec(action(), 0..30),
        pick in 0usize..8,
    ) {
        let mut fs = FillState::new(build_map(&sizes));
        for a in &history {
            apply(&mut fs, a);
        }
        fs.select_color(color(pick));
        let once = fs.clone();
        let changed = fs.select_color(color(pick));
        prop_assert!(changed.is_empty());
        prop_assert_eq!(&fs, &once);
    }
}
