//! Unit tests for bt-edit.
//!
//! Fixtures are small hand-built `MemoryDataset`s along the equator, where
//! 0.001° of longitude is about 111.2 m.

#[cfg(test)]
mod helpers {
    use bt_core::{NodeId, WayId};
    use bt_dataset::{Dataset, MemoryDataset, Way};

    use crate::{ChainRule, GroupPoint, SessionConfig};

    /// W = [A(0,0), B(0,10), C(0,20)], way 100, highway=primary.
    pub fn abc_dataset() -> (MemoryDataset, WayId, [NodeId; 3]) {
        let mut ds = MemoryDataset::new();
        let a = ds.insert_node(1, 0.0, 0.0);
        let b = ds.insert_node(2, 0.0, 10.0);
        let c = ds.insert_node(3, 0.0, 20.0);
        let way = WayId(100);
        ds.add_way(Way::new(way, vec![a, b, c]).with_tag("highway", "primary"));
        (ds, way, [a, b, c])
    }

    /// A short road: 1:(0,0) 2:(0,0.001) 3:(0,0.002) as way 100.
    pub fn road_dataset() -> MemoryDataset {
        let mut ds = MemoryDataset::new();
        let n1 = ds.insert_node(1, 0.0, 0.0);
        let n2 = ds.insert_node(2, 0.0, 0.001);
        let n3 = ds.insert_node(3, 0.0, 0.002);
        ds.add_way(Way::new(WayId(100), vec![n1, n2, n3]).with_tag("highway", "secondary"));
        ds
    }

    /// Three ways end to end, the middle one a bridge deck with no split
    /// points on it.
    ///
    /// ```text
    ///   1 ──w10── 2 ──w20── 3 ──w30── 4
    /// ```
    pub fn multi_way_dataset() -> MemoryDataset {
        let mut ds = MemoryDataset::new();
        for (id, lon) in [(1, 0.0), (2, 0.001), (3, 0.002), (4, 0.003)] {
            ds.insert_node(id, 0.0, lon);
        }
        ds.add_way(Way::new(WayId(10), vec![NodeId(1), NodeId(2)]));
        ds.add_way(Way::new(WayId(20), vec![NodeId(2), NodeId(3)]));
        ds.add_way(Way::new(WayId(30), vec![NodeId(3), NodeId(4)]));
        ds
    }

    pub fn point(lon: f64, way: i64) -> GroupPoint {
        GroupPoint::new(0.0, lon, WayId(way))
    }

    pub fn endpoints_config() -> SessionConfig {
        SessionConfig {
            chain_rule: ChainRule::Endpoints,
            ..SessionConfig::default()
        }
    }
}

// ── NearestPointLocator ───────────────────────────────────────────────────────

#[cfg(test)]
mod locator {
    use approx::assert_abs_diff_eq;

    use bt_core::{Coordinate, NodeId, WayId};
    use bt_dataset::{Dataset, MemoryDataset, Way};

    use super::helpers::abc_dataset;
    use crate::{EditError, NearestPointLocator};

    #[test]
    fn locates_inside_first_segment() {
        let (ds, way, _) = abc_dataset();
        let found = NearestPointLocator::new()
            .locate_way(&ds, way, Coordinate::new(0.0, 5.0))
            .unwrap();
        assert_eq!(found.segment_index, 0);
        assert_eq!(found.insert_index(), 1);
        assert_abs_diff_eq!(found.closest.lat, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(found.closest.lon, 5.0, epsilon = 1e-9);
        assert!(found.distance_m < 1e-3);
    }

    #[test]
    fn tie_keeps_earliest_segment() {
        // Query abeam the shared vertex: both segments clamp to B.
        let (ds, way, _) = abc_dataset();
        let found = NearestPointLocator::new()
            .locate_way(&ds, way, Coordinate::new(1.0, 10.0))
            .unwrap();
        assert_eq!(found.segment_index, 0);
    }

    #[test]
    fn result_is_global_minimum() {
        let polyline = [
            Coordinate::new(52.50, 13.30),
            Coordinate::new(52.51, 13.32),
            Coordinate::new(52.49, 13.35),
            Coordinate::new(52.52, 13.37),
            Coordinate::new(52.50, 13.40),
        ];
        let queries = [
            Coordinate::new(52.505, 13.31),
            Coordinate::new(52.53, 13.36),
            Coordinate::new(52.48, 13.34),
            Coordinate::new(52.60, 13.20),
            Coordinate::new(52.51, 13.32),
        ];
        let locator = NearestPointLocator::new();
        for q in queries {
            let best = locator.locate(&polyline, q).unwrap();
            for (i, pair) in polyline.windows(2).enumerate() {
                let single = locator.locate(pair, q).unwrap();
                assert!(
                    best.distance_m <= single.distance_m,
                    "query {q}: segment {i} is closer than segment {}",
                    best.segment_index
                );
            }
        }
    }

    #[test]
    fn short_polyline_has_no_segment() {
        let locator = NearestPointLocator::new();
        assert!(locator.locate(&[], Coordinate::new(0.0, 0.0)).is_none());
        assert!(locator.locate(&[Coordinate::new(0.0, 0.0)], Coordinate::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn degenerate_and_missing_ways() {
        let mut ds = MemoryDataset::new();
        let n = ds.insert_node(1, 0.0, 0.0);
        ds.add_way(Way::new(WayId(5), vec![n]));
        let locator = NearestPointLocator::new();

        let err = locator.locate_way(&ds, WayId(5), Coordinate::new(0.0, 1.0)).unwrap_err();
        assert!(matches!(err, EditError::DegenerateWay(WayId(5))));

        let err = locator.locate_way(&ds, WayId(6), Coordinate::new(0.0, 1.0)).unwrap_err();
        assert!(matches!(err, EditError::WayNotFound(WayId(6))));
    }

    #[test]
    fn dangling_node_is_a_dataset_error() {
        let mut ds = MemoryDataset::new();
        let n = ds.insert_node(1, 0.0, 0.0);
        ds.add_way(Way::new(WayId(5), vec![n, NodeId(9)]));
        let err = NearestPointLocator::new()
            .locate_way(&ds, WayId(5), Coordinate::new(0.0, 1.0))
            .unwrap_err();
        assert_eq!(err.kind(), "Dataset");
    }
}

// ── WaySplitter ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod splitter {
    use approx::assert_abs_diff_eq;

    use bt_core::{Coordinate, NodeId, WayId};
    use bt_dataset::{CommandJournal, Dataset, Mutation};

    use super::helpers::abc_dataset;
    use crate::{EditError, NearestPointLocator, SplitResult, WaySplitter};

    #[test]
    fn splits_between_a_and_b() {
        let (mut ds, way, [a, b, c]) = abc_dataset();
        let mut journal = CommandJournal::new();
        let found = NearestPointLocator::new()
            .locate_way(&ds, way, Coordinate::new(0.0, 5.0))
            .unwrap();

        let out = WaySplitter::new().split_at(&mut ds, &mut journal, way, &found).unwrap();
        let n = out.node.id;
        assert_eq!(n, NodeId(-1));
        assert_abs_diff_eq!(out.node.coord.lon, 5.0, epsilon = 1e-9);

        assert_eq!(out.before.id, way);
        assert_eq!(out.before.nodes, vec![a, n]);
        assert_eq!(out.after.id, WayId(-1));
        assert_eq!(out.after.nodes, vec![n, b, c]);
        assert_eq!(out.before.tag("highway"), Some("primary"));
        assert_eq!(out.after.tag("highway"), Some("primary"));

        // Dataset agrees with the returned values and selects both halves.
        assert_eq!(ds.way(way), Some(&out.before));
        assert_eq!(ds.way(WayId(-1)), Some(&out.after));
        let selected: Vec<WayId> = ds.selected_ways().iter().map(|w| w.id).collect();
        assert_eq!(selected, vec![way, WayId(-1)]);
    }

    #[test]
    fn halves_reconstruct_the_widened_way() {
        let (mut ds, way, [a, b, c]) = abc_dataset();
        let mut journal = CommandJournal::new();
        let found = NearestPointLocator::new()
            .locate_way(&ds, way, Coordinate::new(0.5, 14.0))
            .unwrap();
        assert_eq!(found.segment_index, 1);

        let out = WaySplitter::new().split_at(&mut ds, &mut journal, way, &found).unwrap();
        let mut joined = out.before.nodes.clone();
        joined.extend_from_slice(&out.after.nodes[1..]);
        assert_eq!(joined, vec![a, b, out.node.id, c]);

        joined.retain(|&id| id != out.node.id);
        assert_eq!(joined, vec![a, b, c]);
    }

    #[test]
    fn journal_records_each_mutation_once_in_order() {
        let (mut ds, way, _) = abc_dataset();
        let mut journal = CommandJournal::new();
        let found = NearestPointLocator::new()
            .locate_way(&ds, way, Coordinate::new(0.0, 5.0))
            .unwrap();
        WaySplitter::new().split_at(&mut ds, &mut journal, way, &found).unwrap();

        let entries = journal.entries();
        assert_eq!(entries.len(), 4);
        assert!(matches!(entries[0], Mutation::AddNode(_)));
        assert!(matches!(&entries[1], Mutation::ChangeWay { before, after }
            if before.nodes.len() == 3 && after.nodes.len() == 4));
        assert!(matches!(&entries[2], Mutation::ChangeWay { after, .. } if after.nodes.len() == 2));
        assert!(matches!(&entries[3], Mutation::AddWay(w) if w.id == WayId(-1)));
    }

    #[test]
    fn stale_result_is_rejected_before_any_mutation() {
        let (mut ds, way, _) = abc_dataset();
        let mut journal = CommandJournal::new();
        let stale = SplitResult {
            segment_index: 2,
            closest:       Coordinate::new(0.0, 25.0),
            distance_m:    0.0,
        };
        let err = WaySplitter::new().split_at(&mut ds, &mut journal, way, &stale).unwrap_err();
        assert!(matches!(err, EditError::NoClosestSegment { way: w, .. } if w == way));
        assert!(journal.is_empty());
        assert_eq!(ds.node_count(), 3);
    }

    #[test]
    fn undo_restores_the_original_way() {
        let (mut ds, way, nodes) = abc_dataset();
        let mut journal = CommandJournal::new();
        let found = NearestPointLocator::new()
            .locate_way(&ds, way, Coordinate::new(0.0, 5.0))
            .unwrap();
        WaySplitter::new().split_at(&mut ds, &mut journal, way, &found).unwrap();

        assert_eq!(journal.undo_all(&mut ds).unwrap(), 4);
        assert_eq!(ds.node_count(), 3);
        assert_eq!(ds.way_count(), 1);
        assert_eq!(ds.way(way).unwrap().nodes, nodes.to_vec());
    }
}

// ── ChainMatcher ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod chain {
    use bt_core::{NodeId, WayId};
    use bt_dataset::Way;

    use crate::{ChainMatcher, ChainRule};

    fn way(ids: &[i64]) -> Way {
        Way::new(WayId(1), ids.iter().map(|&i| NodeId(i)).collect())
    }

    #[test]
    fn literal_never_advances_past_start() {
        let m = ChainMatcher::default();
        assert_eq!(m.rule(), ChainRule::Literal);

        assert!(!m.matches(&way(&[1, 2]), NodeId(1), NodeId(2)));
        assert!(!m.matches(&way(&[1, 2, 3]), NodeId(1), NodeId(3)));
        // Only start == end at the head of the way succeeds.
        assert!(m.matches(&way(&[1, 2, 3]), NodeId(1), NodeId(1)));
        assert!(!m.matches(&way(&[2, 1]), NodeId(1), NodeId(1)));
        assert!(!m.matches(&way(&[]), NodeId(1), NodeId(1)));
    }

    #[test]
    fn endpoints_rule() {
        let m = ChainMatcher::new(ChainRule::Endpoints);
        assert!(m.matches(&way(&[1, 2]), NodeId(1), NodeId(2)));
        assert!(m.matches(&way(&[1, 5, 6, 2]), NodeId(1), NodeId(2)));
        assert!(!m.matches(&way(&[1, 2, 3]), NodeId(1), NodeId(2)));
        assert!(!m.matches(&way(&[1]), NodeId(1), NodeId(1)));
    }

    #[test]
    fn order_sensitive() {
        let m = ChainMatcher::new(ChainRule::Endpoints);
        let forward = way(&[1, 5, 2]);
        let reversed = way(&[2, 5, 1]);
        assert!(m.matches(&forward, NodeId(1), NodeId(2)));
        assert!(!m.matches(&forward, NodeId(2), NodeId(1)));
        assert!(m.matches(&reversed, NodeId(2), NodeId(1)));
        assert!(!m.matches(&reversed, NodeId(1), NodeId(2)));

        let palindrome = way(&[1, 5, 1]);
        assert!(m.matches(&palindrome, NodeId(1), NodeId(1)));
    }

    #[test]
    fn rule_names_in_config() {
        let rule: ChainRule = serde_json::from_str("\"endpoints\"").unwrap();
        assert_eq!(rule, ChainRule::Endpoints);
        assert_eq!(serde_json::to_string(&ChainRule::Literal).unwrap(), "\"literal\"");
    }
}

// ── BridgeTagger ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tagger {
    use bt_core::{Coordinate, NodeId, WayId};
    use bt_dataset::{CommandJournal, Dataset, Mutation, Tags, Way};

    use super::helpers::abc_dataset;
    use crate::{
        BridgeTagger, ChainMatcher, ChainRule, EditError, NearestPointLocator, WaySplitter,
        bridge_tags,
    };

    #[test]
    fn no_candidate_runs_a_to_c_after_split() {
        let (mut ds, way, [a, _, c]) = abc_dataset();
        let mut journal = CommandJournal::new();
        let found = NearestPointLocator::new()
            .locate_way(&ds, way, Coordinate::new(0.0, 5.0))
            .unwrap();
        let out = WaySplitter::new().split_at(&mut ds, &mut journal, way, &found).unwrap();
        let before_len = journal.len();

        let candidates = [out.before.id, out.after.id];
        let err = BridgeTagger::default()
            .tag_bridge(&mut ds, &mut journal, &candidates, a, c)
            .unwrap_err();
        assert!(matches!(err, EditError::AmbiguousBridge { candidates: 2, .. }));
        assert_eq!(err.kind(), "AmbiguousBridge");
        assert_eq!(journal.len(), before_len);
    }

    #[test]
    fn explicit_way_is_tagged() {
        let (mut ds, _, [a, b, _]) = abc_dataset();
        ds.add_way(Way::new(WayId(42), vec![a, b]));
        let mut journal = CommandJournal::new();

        let out = BridgeTagger::default().tag_explicit(&mut ds, &mut journal, &[WayId(42)]);
        assert_eq!(out.tagged, vec![WayId(42)]);
        assert!(out.missing.is_empty());
        assert_eq!(ds.way(WayId(42)).unwrap().tag("bridge"), Some("yes"));
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.entries()[0].to_string(), "retag way w42");
    }

    #[test]
    fn missing_explicit_way_is_reported() {
        let (mut ds, _, _) = abc_dataset();
        let mut journal = CommandJournal::new();
        let out = BridgeTagger::default().tag_explicit(&mut ds, &mut journal, &[WayId(42)]);
        assert!(out.tagged.is_empty());
        assert_eq!(out.missing, vec![WayId(42)]);
        assert!(journal.is_empty());
    }

    #[test]
    fn tagging_twice_is_idempotent() {
        let (mut ds, way, _) = abc_dataset();
        let mut journal = CommandJournal::new();
        let tagger = BridgeTagger::default();

        tagger.tag_explicit(&mut ds, &mut journal, &[way]);
        let after_first = ds.way(way).unwrap().clone();
        let out = tagger.tag_explicit(&mut ds, &mut journal, &[way]);

        assert_eq!(out.tagged, vec![way]);
        assert_eq!(ds.way(way), Some(&after_first));
        assert_eq!(after_first.tags.len(), 2);
        assert_eq!(journal.len(), 1);
    }

    #[test]
    fn first_match_wins() {
        let (mut ds, _, [a, b, _]) = abc_dataset();
        ds.add_way(Way::new(WayId(7), vec![a, b]));
        ds.add_way(Way::new(WayId(8), vec![a, b]));
        let mut journal = CommandJournal::new();
        let tagger = BridgeTagger::new(ChainMatcher::new(ChainRule::Endpoints), bridge_tags());

        let tagged = tagger
            .tag_bridge(&mut ds, &mut journal, &[WayId(99), WayId(8), WayId(7)], a, b)
            .unwrap();
        assert_eq!(tagged, WayId(8));
        assert_eq!(ds.way(WayId(7)).unwrap().tag("bridge"), None);
    }

    #[test]
    fn custom_tags_merge_and_undo() {
        let (mut ds, way, nodes) = abc_dataset();
        let mut journal = CommandJournal::new();
        let mut tags = bridge_tags();
        tags.insert("layer".into(), "1".into());
        let tagger = BridgeTagger::new(ChainMatcher::default(), tags);

        let tagged = tagger
            .tag_bridge(&mut ds, &mut journal, &[way], nodes[0], nodes[0])
            .unwrap();
        assert_eq!(tagged, way);
        let w = ds.way(way).unwrap();
        assert_eq!(w.tag("layer"), Some("1"));
        assert_eq!(w.tag("highway"), Some("primary"));

        journal.undo_all(&mut ds).unwrap();
        let mut original = Tags::new();
        original.insert("highway".into(), "primary".into());
        assert_eq!(ds.way(way).unwrap().tags, original);
        assert!(matches!(journal.entries(), []));
    }

    #[test]
    fn tag_change_is_journaled_with_both_values() {
        let (mut ds, way, _) = abc_dataset();
        let mut journal = CommandJournal::new();
        BridgeTagger::default().tag_explicit(&mut ds, &mut journal, &[way]);
        let Mutation::ChangeWay { before, after } = &journal.entries()[0] else {
            panic!("expected a way change");
        };
        assert_eq!(before.tag("bridge"), None);
        assert_eq!(after.tag("bridge"), Some("yes"));
        assert_eq!(before.nodes, after.nodes);
        assert_eq!(after.nodes.first(), Some(&NodeId(1)));
    }
}

// ── Group config ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod group {
    use std::io::Cursor;

    use bt_core::WayId;

    use crate::{ChainRule, CoordinateGroup, EditError, GroupKind, load_batch, load_batch_reader};

    const BATCH: &str = r#"{
        "session": { "tags": { "bridge": "yes", "layer": "1" }, "chainRule": "endpoints" },
        "groups": [
            [
                { "latitude": 36.99063067649576, "longitude": -85.90225171619728, "wayId": 108707726 },
                { "latitude": 36.990448735147304, "longitude": -85.90199932269573, "way_id": 108707726 }
            ],
            {
                "points": [
                    { "latitude": 37.9340811, "longitude": -87.5476108, "wayId": 17561921 },
                    { "latitude": 37.9363173, "longitude": -87.5462384, "wayId": 97759371 }
                ],
                "additionalBridgeWayIds": [17563421]
            },
            { "points": [{ "latitude": 1.0, "longitude": 2.0, "wayId": 3 }] }
        ]
    }"#;

    #[test]
    fn parses_both_group_shapes() {
        let batch = load_batch_reader(Cursor::new(BATCH)).unwrap();
        assert_eq!(batch.session.chain_rule, ChainRule::Endpoints);
        assert_eq!(batch.session.tags.get("layer").map(String::as_str), Some("1"));
        assert!(!batch.session.discover_interior_ways);
        assert_eq!(batch.groups.len(), 3);

        let simple = &batch.groups[0];
        assert_eq!(simple.kind, GroupKind::Simple);
        assert_eq!(simple.points[1].way_id, WayId(108_707_726));

        let multi = &batch.groups[1];
        assert_eq!(multi.kind, GroupKind::MultiWay);
        assert_eq!(multi.additional_bridge_way_ids, vec![WayId(17_563_421)]);

        assert_eq!(batch.groups[2].kind, GroupKind::MultiWay);
        assert!(batch.groups[2].additional_bridge_way_ids.is_empty());
    }

    #[test]
    fn bare_array_uses_default_session() {
        let json = r#"[[{ "latitude": 0.0, "longitude": 0.5, "wayId": 1 }]]"#;
        let batch = load_batch_reader(Cursor::new(json)).unwrap();
        assert_eq!(batch.session.chain_rule, ChainRule::Literal);
        assert_eq!(batch.session.tags.get("bridge").map(String::as_str), Some("yes"));
        assert_eq!(batch.groups[0].kind, GroupKind::Simple);
    }

    #[test]
    fn empty_group_is_rejected() {
        let err = load_batch_reader(Cursor::new("[[]]")).unwrap_err();
        assert!(matches!(err, EditError::Config(msg) if msg.contains("group 0")));
    }

    #[test]
    fn out_of_range_point_is_rejected() {
        let json = r#"[[{ "latitude": 91.0, "longitude": 0.0, "wayId": 1 }]]"#;
        let err = load_batch_reader(Cursor::new(json)).unwrap_err();
        assert_eq!(err.kind(), "Config");
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = load_batch_reader(Cursor::new("{ nope")).unwrap_err();
        assert_eq!(err.kind(), "Json");
    }

    #[test]
    fn groups_serialize_back_to_their_shape() {
        let batch = load_batch_reader(Cursor::new(BATCH)).unwrap();
        let simple = serde_json::to_value(&batch.groups[0]).unwrap();
        assert!(simple.is_array());
        let multi = serde_json::to_value(&batch.groups[1]).unwrap();
        assert!(multi.get("additionalBridgeWayIds").is_some());

        let back: CoordinateGroup = serde_json::from_value(multi).unwrap();
        assert_eq!(back, batch.groups[1]);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.json");
        std::fs::write(&path, BATCH).unwrap();
        assert_eq!(load_batch(&path).unwrap().groups.len(), 3);
        assert_eq!(load_batch(&dir.path().join("absent.json")).unwrap_err().kind(), "Io");
    }
}

// ── EditSession ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod session {
    use bt_core::{NodeId, WayId};
    use bt_dataset::{CommandJournal, Dataset, Way};

    use super::helpers::{endpoints_config, multi_way_dataset, point, road_dataset};
    use crate::{
        CoordinateGroup, EditError, EditSession, GroupPoint, GroupReport, GroupState, NoopObserver,
        PointOutcome, SessionConfig, SessionObserver, SplitOutcome,
    };

    #[derive(Default)]
    struct Recorder {
        starts:      Vec<usize>,
        splits:      Vec<(usize, usize, WayId)>,
        failed:      Vec<(usize, usize, &'static str)>,
        tagged:      Vec<(usize, WayId)>,
        tag_errors:  Vec<(usize, &'static str)>,
        ends:        Vec<GroupState>,
        session_end: bool,
    }

    impl SessionObserver for Recorder {
        fn on_group_start(&mut self, group: usize, _spec: &CoordinateGroup) {
            self.starts.push(group);
        }
        fn on_point_split(&mut self, group: usize, point: usize, way: WayId, _o: &SplitOutcome) {
            self.splits.push((group, point, way));
        }
        fn on_point_failed(&mut self, group: usize, point: usize, _s: &GroupPoint, e: &EditError) {
            self.failed.push((group, point, e.kind()));
        }
        fn on_bridge_tagged(&mut self, group: usize, way: WayId) {
            self.tagged.push((group, way));
        }
        fn on_tagging_failed(&mut self, group: usize, e: &EditError) {
            self.tag_errors.push((group, e.kind()));
        }
        fn on_group_end(&mut self, _group: usize, report: &GroupReport) {
            self.ends.push(report.state.clone());
        }
        fn on_session_end(&mut self, _report: &crate::SessionReport) {
            self.session_end = true;
        }
    }

    fn simple_group() -> CoordinateGroup {
        CoordinateGroup::simple(vec![point(0.0005, 100), point(0.0015, 100)])
    }

    #[test]
    fn simple_group_tags_the_span_between_split_nodes() {
        let mut ds = road_dataset();
        let mut journal = CommandJournal::new();
        let session = EditSession::new(endpoints_config());

        let report = session.run(&mut ds, &mut journal, &[simple_group()], &mut NoopObserver);
        let group = &report.groups[0];
        assert_eq!(group.state, GroupState::Done);
        assert_eq!(group.split_nodes(), vec![NodeId(-1), NodeId(-2)]);
        assert_eq!(group.bridges, vec![WayId(-1)]);

        let bridge = ds.way(WayId(-1)).unwrap();
        assert_eq!(bridge.nodes, vec![NodeId(-1), NodeId(2), NodeId(-2)]);
        assert_eq!(bridge.tag("bridge"), Some("yes"));
        assert_eq!(bridge.tag("highway"), Some("secondary"));
        assert_eq!(ds.way(WayId(100)).unwrap().nodes, vec![NodeId(1), NodeId(-1)]);
        assert_eq!(ds.way(WayId(-2)).unwrap().nodes, vec![NodeId(-2), NodeId(3)]);
        assert_eq!(ds.way(WayId(100)).unwrap().tag("bridge"), None);

        // Two splits of four mutations each, then one retag.
        assert_eq!(journal.len(), 9);
    }

    #[test]
    fn later_point_is_located_on_the_split_off_piece() {
        let mut ds = road_dataset();
        let mut journal = CommandJournal::new();
        let report = EditSession::new(endpoints_config()).run(
            &mut ds,
            &mut journal,
            &[simple_group()],
            &mut NoopObserver,
        );
        let second = &report.groups[0].points[1];
        assert_eq!(second.requested, WayId(100));
        assert!(matches!(second.outcome, PointOutcome::Split { way, .. } if way == WayId(-1)));
    }

    #[test]
    fn literal_rule_finds_no_bridge() {
        let mut ds = road_dataset();
        let mut journal = CommandJournal::new();
        let report = EditSession::new(SessionConfig::default()).run(
            &mut ds,
            &mut journal,
            &[simple_group()],
            &mut NoopObserver,
        );
        let group = &report.groups[0];
        assert!(matches!(&group.state, GroupState::Failed(reason) if reason.contains("AmbiguousBridge")));
        assert_eq!(group.errors[0].kind, "AmbiguousBridge");
        // The splits stay in place.
        assert_eq!(group.split_nodes().len(), 2);
        assert_eq!(journal.len(), 8);
    }

    #[test]
    fn failed_group_does_not_stop_the_next() {
        let mut ds = road_dataset();
        let mut journal = CommandJournal::new();
        let mut recorder = Recorder::default();
        let groups = [
            CoordinateGroup::simple(vec![point(0.0005, 999), point(0.0015, 999)]),
            simple_group(),
        ];

        let report = EditSession::new(endpoints_config()).run(&mut ds, &mut journal, &groups, &mut recorder);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.done_count(), 1);
        assert!(matches!(&report.groups[0].state, GroupState::Failed(r) if r.contains("MissingEndpoint")));

        assert_eq!(recorder.starts, vec![0, 1]);
        assert_eq!(recorder.failed, vec![(0, 0, "WayNotFound"), (0, 1, "WayNotFound")]);
        assert_eq!(recorder.tag_errors, vec![(0, "MissingEndpoint")]);
        assert_eq!(recorder.splits.len(), 2);
        assert_eq!(recorder.tagged, vec![(1, WayId(-1))]);
        assert_eq!(recorder.ends.len(), 2);
        assert!(recorder.session_end);
    }

    #[test]
    fn degenerate_way_fails_the_point_only() {
        let mut ds = road_dataset();
        ds.add_way(Way::new(WayId(7), vec![NodeId(1)]));
        let mut journal = CommandJournal::new();
        let mut recorder = Recorder::default();
        let groups = [CoordinateGroup::simple(vec![point(0.0005, 7)])];

        let report = EditSession::new(endpoints_config()).run(&mut ds, &mut journal, &groups, &mut recorder);
        assert_eq!(recorder.failed, vec![(0, 0, "DegenerateWay")]);
        assert!(matches!(report.groups[0].state, GroupState::Failed(_)));
        assert!(journal.is_empty());
    }

    #[test]
    fn multi_way_group_tags_end_pieces_and_listed_ways() {
        let mut ds = multi_way_dataset();
        let mut journal = CommandJournal::new();
        let mut recorder = Recorder::default();
        let group = CoordinateGroup::multi_way(
            vec![point(0.0005, 10), point(0.0025, 30)],
            vec![WayId(20), WayId(42)],
        );

        // The multi-way pass does not depend on the configured rule.
        let report = EditSession::new(SessionConfig::default()).run(
            &mut ds,
            &mut journal,
            &[group],
            &mut recorder,
        );
        let group = &report.groups[0];
        assert_eq!(group.state, GroupState::Done);
        assert_eq!(group.bridges, vec![WayId(-1), WayId(30), WayId(20)]);
        assert_eq!(group.errors.len(), 1);
        assert_eq!(group.errors[0].kind, "MissingAdditionalWay");

        // First point: new node → old last node of w10.
        assert_eq!(ds.way(WayId(-1)).unwrap().nodes, vec![NodeId(-1), NodeId(2)]);
        // Last point: old first node of w30 → new node.
        assert_eq!(ds.way(WayId(30)).unwrap().nodes, vec![NodeId(3), NodeId(-2)]);
        for id in [WayId(-1), WayId(20), WayId(30)] {
            assert_eq!(ds.way(id).unwrap().tag("bridge"), Some("yes"), "{id}");
        }
        for id in [WayId(10), WayId(-2)] {
            assert_eq!(ds.way(id).unwrap().tag("bridge"), None, "{id}");
        }
        assert_eq!(recorder.tag_errors, vec![(0, "MissingAdditionalWay")]);
    }

    #[test]
    fn middle_point_of_a_multi_way_group_is_anchored_backwards() {
        let mut ds = multi_way_dataset();
        let mut journal = CommandJournal::new();
        let mut recorder = Recorder::default();
        let group = CoordinateGroup::multi_way(
            vec![point(0.0005, 10), point(0.0015, 20), point(0.0025, 30)],
            vec![],
        );

        let report = EditSession::new(SessionConfig::default()).run(
            &mut ds,
            &mut journal,
            &[group],
            &mut recorder,
        );
        let group = &report.groups[0];
        assert_eq!(group.state, GroupState::Done);
        assert_eq!(recorder.splits, vec![(0, 0, WayId(10)), (0, 1, WayId(20)), (0, 2, WayId(30))]);

        // The middle point splits w20 into [2, -2] + [-2, 3] and then looks
        // for a piece running from the old last node (3) to the new node.
        assert_eq!(ds.way(WayId(20)).unwrap().nodes, vec![NodeId(2), NodeId(-2)]);
        assert_eq!(ds.way(WayId(-2)).unwrap().nodes, vec![NodeId(-2), NodeId(3)]);
        assert_eq!(recorder.tag_errors, vec![(0, "AmbiguousBridge")]);
        assert_eq!(group.errors.len(), 1);
        assert_eq!(group.errors[0].kind, "AmbiguousBridge");

        assert_eq!(group.bridges, vec![WayId(-1), WayId(30)]);
        for id in [WayId(20), WayId(-2)] {
            assert_eq!(ds.way(id).unwrap().tag("bridge"), None, "{id}");
        }
    }

    #[test]
    fn multi_way_point_on_a_missing_way_fails_alone() {
        let mut ds = multi_way_dataset();
        let mut journal = CommandJournal::new();
        let mut recorder = Recorder::default();
        let group = CoordinateGroup::multi_way(vec![point(0.0005, 10), point(0.0025, 999)], vec![]);

        let report = EditSession::new(SessionConfig::default()).run(
            &mut ds,
            &mut journal,
            &[group],
            &mut recorder,
        );
        assert_eq!(recorder.failed, vec![(0, 1, "WayNotFound")]);
        assert_eq!(recorder.splits, vec![(0, 0, WayId(10))]);
        assert_eq!(report.groups[0].state, GroupState::Done);
        assert_eq!(report.groups[0].bridges, vec![WayId(-1)]);
        assert_eq!(ds.way(WayId(30)).unwrap().tag("bridge"), None);
    }

    #[test]
    fn interior_ways_are_discovered_when_asked() {
        let mut ds = multi_way_dataset();
        let mut journal = CommandJournal::new();
        let config = SessionConfig {
            discover_interior_ways: true,
            ..SessionConfig::default()
        };
        let group = CoordinateGroup::multi_way(vec![point(0.0005, 10), point(0.0025, 30)], vec![]);

        let report = EditSession::new(config).run(&mut ds, &mut journal, &[group], &mut NoopObserver);
        assert!(report.groups[0].bridges.contains(&WayId(20)));
        assert_eq!(ds.way(WayId(20)).unwrap().tag("bridge"), Some("yes"));
        assert!(report.groups[0].errors.is_empty());
    }

    #[test]
    fn interior_ways_are_not_discovered_by_default() {
        let mut ds = multi_way_dataset();
        let mut journal = CommandJournal::new();
        let group = CoordinateGroup::multi_way(vec![point(0.0005, 10), point(0.0025, 30)], vec![]);

        let report = EditSession::new(SessionConfig::default()).run(
            &mut ds,
            &mut journal,
            &[group],
            &mut NoopObserver,
        );
        assert!(!report.groups[0].bridges.contains(&WayId(20)));
    }

    #[test]
    fn undo_all_reverts_a_whole_session() {
        let mut ds = multi_way_dataset();
        let pristine = ds.clone();
        let mut journal = CommandJournal::new();
        let group = CoordinateGroup::multi_way(vec![point(0.0005, 10), point(0.0025, 30)], vec![WayId(20)]);
        EditSession::new(SessionConfig::default()).run(&mut ds, &mut journal, &[group], &mut NoopObserver);
        assert!(!journal.is_empty());

        journal.undo_all(&mut ds).unwrap();
        assert_eq!(ds.node_count(), pristine.node_count());
        assert_eq!(ds.way_count(), pristine.way_count());
        for way in pristine.ways() {
            assert_eq!(ds.way(way.id), Some(way));
        }
    }

    #[test]
    fn report_counts() {
        let mut ds = road_dataset();
        let mut journal = CommandJournal::new();
        let groups = [simple_group(), CoordinateGroup::simple(vec![])];
        let report = EditSession::new(endpoints_config()).run(&mut ds, &mut journal, &groups, &mut NoopObserver);
        assert_eq!(report.done_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.bridges().collect::<Vec<_>>(), vec![WayId(-1)]);
    }
}

// ── SplitPlanner ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod planner {
    use std::io::Cursor;

    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use bt_core::{Coordinate, NodeId, WayId};
    use bt_dataset::{CommandJournal, Dataset, MemoryDataset, Way};

    use super::helpers::{endpoints_config, multi_way_dataset, road_dataset};
    use crate::{
        EditSession, GroupKind, GroupState, NoopObserver, SessionConfig, SplitPlanner,
        load_sites_reader,
    };

    /// Longitude degrees per metre on the equator (R = 6 371 km).
    const DEG_PER_M: f64 = 0.001 / 111.194_926_644_558_73;

    #[test]
    fn walks_half_the_length_each_way() {
        let ds = road_dataset();
        let plan = SplitPlanner::new()
            .plan(&ds, WayId(100), Coordinate::new(0.0001, 0.0005), 20.0)
            .unwrap();
        assert!(!plan.is_clamped());
        assert_eq!(plan.snapped.segment_index, 0);
        assert_abs_diff_eq!(plan.backward.lon, 0.0005 - 10.0 * DEG_PER_M, epsilon = 1e-9);
        assert_abs_diff_eq!(plan.forward.lon, 0.0005 + 10.0 * DEG_PER_M, epsilon = 1e-9);
        assert_relative_eq!(plan.snapped.closest.distance_m(plan.forward), 10.0, epsilon = 1e-6);
    }

    #[test]
    fn walk_crosses_vertices() {
        let ds = road_dataset();
        let plan = SplitPlanner::new()
            .plan(&ds, WayId(100), Coordinate::new(0.0, 0.0005), 200.0)
            .unwrap();
        assert!(!plan.forward_clamped);
        assert!(plan.backward_clamped);
        assert_abs_diff_eq!(plan.forward.lon, 0.0005 + 100.0 * DEG_PER_M, epsilon = 1e-9);
        assert_abs_diff_eq!(plan.backward.lon, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn long_bridge_is_clamped_to_both_ends() {
        let ds = road_dataset();
        let plan = SplitPlanner::new()
            .plan(&ds, WayId(100), Coordinate::new(0.0, 0.0005), 400.0)
            .unwrap();
        assert!(plan.backward_clamped && plan.forward_clamped);
        assert_abs_diff_eq!(plan.forward.lon, 0.002, epsilon = 1e-12);
    }

    #[test]
    fn walk_continues_onto_the_joined_way() {
        let ds = multi_way_dataset();
        let plan = SplitPlanner::new()
            .plan(&ds, WayId(10), Coordinate::new(0.0, 0.0009), 60.0)
            .unwrap();
        assert!(!plan.is_clamped());
        assert_eq!(plan.backward_way, WayId(10));
        assert_eq!(plan.forward_way, WayId(20));
        assert_abs_diff_eq!(plan.backward.lon, 0.0009 - 30.0 * DEG_PER_M, epsilon = 1e-9);
        assert_abs_diff_eq!(plan.forward.lon, 0.0009 + 30.0 * DEG_PER_M, epsilon = 1e-9);

        let group = plan.to_group();
        assert_eq!(group.kind, GroupKind::MultiWay);
        assert_eq!(group.points[0].way_id, WayId(10));
        assert_eq!(group.points[1].way_id, WayId(20));
        assert!(group.additional_bridge_way_ids.is_empty());
    }

    #[test]
    fn joined_way_is_walked_against_its_direction() {
        // w20 is drawn 3 → 2, so it joins w10 at its last node.
        let mut ds = MemoryDataset::new();
        for (id, lon) in [(1, 0.0), (2, 0.001), (3, 0.002)] {
            ds.insert_node(id, 0.0, lon);
        }
        ds.add_way(Way::new(WayId(10), vec![NodeId(1), NodeId(2)]));
        ds.add_way(Way::new(WayId(20), vec![NodeId(3), NodeId(2)]));

        let plan = SplitPlanner::new()
            .plan(&ds, WayId(10), Coordinate::new(0.0, 0.0009), 60.0)
            .unwrap();
        assert!(!plan.forward_clamped);
        assert_eq!(plan.forward_way, WayId(20));
        assert_abs_diff_eq!(plan.forward.lon, 0.0009 + 30.0 * DEG_PER_M, epsilon = 1e-9);
    }

    #[test]
    fn bridge_over_a_whole_way_lists_it_as_interior() {
        let ds = multi_way_dataset();
        let plan = SplitPlanner::new()
            .plan(&ds, WayId(20), Coordinate::new(0.0, 0.0015), 200.0)
            .unwrap();
        assert!(!plan.is_clamped());
        assert_eq!((plan.backward_way, plan.forward_way), (WayId(10), WayId(30)));

        let group = plan.to_group();
        assert_eq!(group.kind, GroupKind::MultiWay);
        assert_eq!(group.additional_bridge_way_ids, vec![WayId(20)]);
    }

    #[test]
    fn clamps_when_the_joined_way_runs_out_too() {
        let ds = multi_way_dataset();
        let plan = SplitPlanner::new()
            .plan(&ds, WayId(10), Coordinate::new(0.0, 0.0009), 1000.0)
            .unwrap();
        assert!(plan.backward_clamped && plan.forward_clamped);
        assert_eq!(plan.forward_way, WayId(20));
        assert_abs_diff_eq!(plan.forward.lon, 0.002, epsilon = 1e-12);
        assert_eq!(plan.backward_way, WayId(10));
        assert_abs_diff_eq!(plan.backward.lon, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn planned_multi_way_group_runs() {
        let mut ds = multi_way_dataset();
        let plan = SplitPlanner::new()
            .plan(&ds, WayId(10), Coordinate::new(0.0, 0.0009), 60.0)
            .unwrap();
        let mut journal = CommandJournal::new();
        let report = EditSession::new(SessionConfig::default()).run(
            &mut ds,
            &mut journal,
            &[plan.to_group()],
            &mut NoopObserver,
        );
        let group = &report.groups[0];
        assert_eq!(group.state, GroupState::Done);
        assert_eq!(group.bridges, vec![WayId(-1), WayId(20)]);

        let length: f64 = group
            .bridges
            .iter()
            .map(|&id| {
                let coords = ds.way_coordinates(ds.way(id).unwrap()).unwrap();
                coords.windows(2).map(|p| p[0].distance_m(p[1])).sum::<f64>()
            })
            .sum();
        assert_relative_eq!(length, 60.0, epsilon = 1e-3);
    }

    #[test]
    fn planned_group_tags_a_bridge_of_the_right_length() {
        let mut ds = road_dataset();
        let plan = SplitPlanner::new()
            .plan(&ds, WayId(100), Coordinate::new(0.0001, 0.0005), 20.0)
            .unwrap();
        let mut journal = CommandJournal::new();
        let report = EditSession::new(endpoints_config()).run(
            &mut ds,
            &mut journal,
            &[plan.to_group()],
            &mut NoopObserver,
        );
        let group = &report.groups[0];
        assert_eq!(group.state, GroupState::Done);

        let bridge = ds.way(group.bridges[0]).unwrap();
        let coords = ds.way_coordinates(bridge).unwrap();
        let length: f64 = coords.windows(2).map(|p| p[0].distance_m(p[1])).sum();
        assert_relative_eq!(length, 20.0, epsilon = 1e-3);
    }

    #[test]
    fn plan_sites_keeps_failures_in_place() {
        let ds = road_dataset();
        let sites = load_sites_reader(Cursor::new(
            "way_id,bridge_length,latitude,longitude\n100,20,0.0,0.0005\n555,20,0.0,0.0005\n",
        ))
        .unwrap();
        let plans = SplitPlanner::new().plan_sites(&ds, &sites);
        assert_eq!(plans.len(), 2);
        assert!(plans[0].is_ok());
        assert_eq!(plans[1].as_ref().unwrap_err().kind(), "WayNotFound");
    }

    #[test]
    fn site_csv_validation() {
        let sites = load_sites_reader(Cursor::new(
            "way_id,bridge_length,latitude,longitude\n108707726,20.5,36.9879919,-85.9069943\n",
        ))
        .unwrap();
        assert_eq!(sites[0].way_id, WayId(108_707_726));
        assert_eq!(sites[0].length_m, 20.5);

        let err = load_sites_reader(Cursor::new(
            "way_id,bridge_length,latitude,longitude\n1,-3,0,0\n",
        ))
        .unwrap_err();
        assert_eq!(err.kind(), "Config");

        let err = load_sites_reader(Cursor::new("way_id,bridge_length\n1,abc\n")).unwrap_err();
        assert_eq!(err.kind(), "Csv");
    }
}

// ── Reports and errors ────────────────────────────────────────────────────────

#[cfg(test)]
mod report {
    use bt_core::WayId;
    use bt_dataset::{CommandJournal, DatasetError};

    use super::helpers::{endpoints_config, point, road_dataset};
    use crate::{CoordinateGroup, CsvReport, EditError, EditSession};

    fn run_into<W: std::io::Write>(report: &mut CsvReport<W>) {
        let mut ds = road_dataset();
        let mut journal = CommandJournal::new();
        let groups = [
            CoordinateGroup::simple(vec![point(0.0005, 100), point(0.0015, 100)]),
            CoordinateGroup::simple(vec![point(0.0005, 999)]),
        ];
        EditSession::new(endpoints_config()).run(&mut ds, &mut journal, &groups, report);
    }

    #[test]
    fn one_row_per_event() {
        let mut report = CsvReport::from_writer(Vec::new()).unwrap();
        run_into(&mut report);
        assert!(report.take_error().is_none());
        assert_eq!(report.rows(), 5);

        let text = String::from_utf8(report.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "group,event,way_id,node_id,latitude,longitude,detail");

        let first: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(&first[..4], ["0", "split", "100", "-1"]);
        assert!(first[4].parse::<f64>().unwrap().abs() < 1e-6);
        assert_eq!(first[5], "0.0005000");
        assert_eq!(first[6], "new way -1");

        assert!(lines[2].starts_with("0,split,-1,-2,"));
        assert_eq!(lines[3], "0,bridge,-1,,,,");
        assert!(lines[4].starts_with("1,point_failed,999,,0.0000000,0.0005000,WayNotFound"));
        assert!(lines[5].starts_with("1,tagging_failed,,,,,MissingEndpoint"));
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut report = CsvReport::create(&path).unwrap();
        run_into(&mut report);
        drop(report);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn dataset_kinds_are_lifted() {
        let e: EditError = DatasetError::WayNotFound(WayId(3)).into();
        assert!(matches!(e, EditError::WayNotFound(WayId(3))));
        let e: EditError = DatasetError::SelectionInvalid(2).into();
        assert_eq!(e.kind(), "Dataset");
    }
}
