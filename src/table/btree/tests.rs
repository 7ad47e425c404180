use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tempfile::TempDir;

use disk::DiskError;

use super::*;
use crate::error::FormatError;

const PAYLOAD: usize = 520;

fn payload(key: Key) -> Vec<u8> {
    let mut payload = vec![0; PAYLOAD];
    payload[..4].copy_from_slice(&key.to_le_bytes());
    payload[4] = 0xEE;
    payload
}

fn small_fanout() -> TreeConfig {
    TreeConfig::new(PAYLOAD).with_max_internal_cells(3)
}

fn open(dir: &TempDir, config: TreeConfig) -> BTree {
    BTree::open_or_create(dir.path().join("tree.db"), config).unwrap()
}

fn leaf(tree: &mut BTree, page: PageNum) -> LeafNode {
    match tree.read_node(page).unwrap() {
        Node::Leaf(leaf) => leaf,
        Node::Internal(_) => panic!("page {} is not a leaf", page),
    }
}

fn internal(tree: &mut BTree, page: PageNum) -> InternalNode {
    match tree.read_node(page).unwrap() {
        Node::Internal(internal) => internal,
        Node::Leaf(_) => panic!("page {} is not internal", page),
    }
}

#[test]
fn new_tree_is_empty() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    assert_eq!(tree.meta(), TreeMeta::default());
    assert_eq!(tree.height().unwrap(), 0);
    assert_eq!(tree.search(1).unwrap(), None);
}

#[test]
fn single_insert() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    let mut data = vec![0; PAYLOAD];
    data[..18].copy_from_slice(b"Hello World Insert");

    tree.insert(1, &data).unwrap();

    assert_eq!(
        tree.meta(),
        TreeMeta {
            root: 1,
            first_leaf: 1,
            node_count: 1,
        }
    );
    let found = tree.search(1).unwrap().unwrap();
    assert!(found.starts_with(b"Hello World Insert"));
    assert_eq!(leaf(&mut tree, 1).node_type(), NodeType::Root);
}

#[test]
fn search_on_empty_tree_reads_nothing() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    let before = tree.io_stats();
    assert_eq!(tree.search(42).unwrap(), None);
    assert_eq!(tree.io_stats(), before);
}

#[test]
fn first_leaf_split() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    for key in 1..=7 {
        tree.insert(key, &payload(key)).unwrap();
    }

    assert_eq!(
        tree.meta(),
        TreeMeta {
            root: 3,
            first_leaf: 1,
            node_count: 3,
        }
    );
    assert_eq!(tree.height().unwrap(), 1);

    let left = leaf(&mut tree, 1);
    let right = leaf(&mut tree, 2);
    assert_eq!(left.keys().collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(right.keys().collect::<Vec<_>>(), vec![4, 5, 6, 7]);
    assert_eq!(left.node_type(), NodeType::Leaf);
    assert_eq!(left.next(), 2);
    assert_eq!(right.next(), NO_PAGE);
    assert_eq!((left.parent(), right.parent()), (3, 3));

    let root = internal(&mut tree, 3);
    assert_eq!(
        root.cells(),
        &[InternalCell {
            key: 4,
            left: 1,
            right: 2,
        }]
    );
    assert_eq!(root.parent(), NO_PAGE);
}

#[test]
fn sequential_inserts_grow_two_levels() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    for key in 1..=17 {
        tree.insert(key, &payload(key)).unwrap();
    }

    let meta = tree.meta();
    assert_eq!(meta.node_count, 8);
    assert_eq!(meta.root, 8);
    assert_eq!(meta.first_leaf, 1);
    assert_eq!(tree.height().unwrap(), 2);

    for key in 1..=17 {
        assert_eq!(tree.search(key).unwrap(), Some(payload(key)), "key {}", key);
    }
    assert_eq!(tree.search(0).unwrap(), None);
    assert_eq!(tree.search(18).unwrap(), None);

    let root = internal(&mut tree, 8);
    assert_eq!(root.children(), vec![3, 7]);
    assert_eq!(root.cells()[0].key, 10);
    let right = internal(&mut tree, 7);
    assert_eq!(right.children(), vec![5, 6]);
    for child in right.children() {
        assert_eq!(leaf(&mut tree, child).parent(), 7);
    }
    assert_eq!(internal(&mut tree, 3).parent(), 8);
}

#[test]
fn duplicate_key_is_accepted() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    for key in 1..=17 {
        tree.insert(key, &payload(key)).unwrap();
    }
    let newer = vec![0x12; PAYLOAD];
    tree.insert(12, &newer).unwrap();

    assert_eq!(tree.search(12).unwrap(), Some(newer));
    assert_eq!(tree.search(11).unwrap(), Some(payload(11)));
    assert_eq!(tree.search(13).unwrap(), Some(payload(13)));
}

#[test]
fn duplicates_across_a_split() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    for round in 0..10u8 {
        tree.insert(5, &vec![round; PAYLOAD]).unwrap();
    }
    let found = tree.search(5).unwrap().unwrap();
    assert!(found[0] < 10 && found.iter().all(|b| *b == found[0]));
    assert_eq!(tree.search(4).unwrap(), None);
    assert_eq!(tree.search(6).unwrap(), None);
}

#[test]
fn random_order_inserts() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    let mut keys: Vec<Key> = (0..300).map(|k| k * 3).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(0xB7EE));

    for key in &keys {
        tree.insert(*key, &payload(*key)).unwrap();
    }
    for key in 0..900 {
        let expected = (key % 3 == 0).then(|| payload(key));
        assert_eq!(tree.search(key).unwrap(), expected, "key {}", key);
    }
    assert!(tree.height().unwrap() >= 3);
}

#[test]
fn reopen_keeps_entries() {
    let dir = TempDir::new().unwrap();
    let meta = {
        let mut tree = open(&dir, small_fanout());
        for key in (1..=40).rev() {
            tree.insert(key, &payload(key)).unwrap();
        }
        tree.meta()
    };

    let mut tree = open(&dir, small_fanout());
    assert_eq!(tree.meta(), meta);
    for key in 1..=40 {
        assert_eq!(tree.search(key).unwrap(), Some(payload(key)));
    }
    tree.insert(41, &payload(41)).unwrap();
    assert_eq!(tree.search(41).unwrap(), Some(payload(41)));
}

#[test]
fn default_fanout_keeps_one_internal_level() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, TreeConfig::new(16));
    for key in 0..2000 {
        tree.insert(key, &[key as u8; 16]).unwrap();
    }
    assert_eq!(tree.height().unwrap(), 1);
    assert_eq!(tree.search(1999).unwrap(), Some(vec![1999u32 as u8; 16]));
}

#[test]
fn wrong_payload_size() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    let err = tree.insert(1, &[0; 10]).unwrap_err();
    assert!(matches!(
        err,
        Error::PayloadSize {
            expected: PAYLOAD,
            actual: 10
        }
    ));
    assert!(tree.meta().is_empty());
}

#[test]
fn reopen_with_other_payload_size() {
    let dir = TempDir::new().unwrap();
    {
        let mut tree = open(&dir, small_fanout());
        tree.insert(1, &payload(1)).unwrap();
    }
    let mut tree = open(&dir, TreeConfig::new(16));
    let err = tree.search(1).unwrap_err();
    assert!(matches!(
        err,
        Error::Format {
            page: 1,
            source: FormatError::CellSize { .. }
        }
    ));
}

#[test]
fn corrupt_metadata_page() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree.db");
    std::fs::write(&path, vec![0x55; crate::PAGE_SIZE]).unwrap();
    let err = BTree::open_or_create(&path, small_fanout()).unwrap_err();
    assert!(matches!(
        err,
        Error::Format {
            page: META_PAGE,
            source: FormatError::UnknownTag([0x55, 0x55])
        }
    ));
}

#[test]
fn truncated_file_is_not_reinitialized() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree.db");
    std::fs::write(&path, vec![0x42; 100]).unwrap();

    let err = BTree::open_or_create(&path, small_fanout()).unwrap_err();
    assert!(matches!(
        err,
        Error::Disk(DiskError::ShortRead {
            block: META_PAGE,
            read: 100
        })
    ));
    assert_eq!(std::fs::read(&path).unwrap(), vec![0x42; 100]);
}

#[test]
fn child_pointing_back_at_its_parent() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    for key in 1..=7 {
        tree.insert(key, &payload(key)).unwrap();
    }
    let looped = InternalNode::new_root(
        3,
        1,
        InternalCell {
            key: 4,
            left: 3,
            right: 3,
        },
        3,
    );
    tree.pager.write_internal(&looped).unwrap();

    let height_error = |err: Error| {
        matches!(
            err,
            Error::Format {
                page: 3,
                source: FormatError::Height {
                    expected: 0,
                    found: 1
                }
            }
        )
    };
    assert!(height_error(tree.search(1).unwrap_err()));
    assert!(height_error(tree.search(9).unwrap_err()));
    assert!(height_error(tree.insert(8, &payload(8)).unwrap_err()));
}

#[test]
fn failed_split_restores_metadata() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    for key in 1..=9 {
        tree.insert(key, &payload(key)).unwrap();
    }
    let before = tree.meta();
    assert_eq!(before.node_count, 3);

    // Leaf 2 now claims leaf 1 as its parent, so its next split fails.
    let mut node = tree.read_node(2).unwrap();
    node.set_parent(1);
    tree.pager.write_node(&node).unwrap();

    let err = tree.insert(10, &payload(10)).unwrap_err();
    assert!(matches!(
        err,
        Error::Format {
            page: 1,
            source: FormatError::Height {
                expected: 1,
                found: 0
            }
        }
    ));
    assert_eq!(tree.meta(), before);

    let reopened = open(&dir, small_fanout());
    assert_eq!(reopened.meta(), before);
}

#[test]
fn metadata_page_is_not_a_node() {
    let dir = TempDir::new().unwrap();
    let mut tree = open(&dir, small_fanout());
    tree.insert(1, &payload(1)).unwrap();
    assert!(matches!(
        tree.read_node(META_PAGE),
        Err(Error::ReservedPage(0))
    ));
}

#[test]
fn invalid_config() {
    let dir = TempDir::new().unwrap();
    let err = BTree::open_or_create(
        dir.path().join("tree.db"),
        TreeConfig::new(PAYLOAD).with_max_internal_cells(1),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
