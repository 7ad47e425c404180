use btree_db::{
    table::btree::{Key, Node, PageNum, NO_PAGE},
    BTree, TreeConfig,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tempfile::TempDir;

struct Walk {
    nodes: usize,
    leaves: Vec<PageNum>,
    keys: Vec<Key>,
}

/// Checks ordering, bounds, parent pointers, heights and pointer coherence of
/// the subtree at `page`.
fn walk(
    tree: &mut BTree,
    page: PageNum,
    parent: PageNum,
    bounds: (Option<Key>, Option<Key>),
    height: u8,
    out: &mut Walk,
) {
    let node = tree.read_node(page).unwrap();
    out.nodes += 1;
    assert_eq!(node.parent(), parent, "parent of page {}", page);
    assert_eq!(node.height(), height, "height of page {}", page);
    let in_bounds = |key: Key| {
        bounds.0.map_or(true, |lo| key >= lo) && bounds.1.map_or(true, |hi| key < hi)
    };

    match node {
        Node::Leaf(leaf) => {
            let keys: Vec<Key> = leaf.keys().collect();
            assert!(keys.windows(2).all(|w| w[0] < w[1]), "leaf {} order", page);
            assert!(keys.iter().all(|k| in_bounds(*k)), "leaf {} bounds", page);
            assert!(leaf.num_cells() < leaf.max_cells());
            out.leaves.push(page);
            out.keys.extend(keys);
        }
        Node::Internal(internal) => {
            let cells = internal.cells();
            assert!(!cells.is_empty());
            assert!(cells.len() <= internal.max_cells());
            assert!(cells.windows(2).all(|w| w[0].key < w[1].key));
            assert!(cells.windows(2).all(|w| w[0].right == w[1].left));
            assert!(cells.iter().all(|c| in_bounds(c.key)));

            let mut lo = bounds.0;
            for cell in cells {
                walk(tree, cell.left, page, (lo, Some(cell.key)), height - 1, out);
                lo = Some(cell.key);
            }
            let last = cells[cells.len() - 1];
            walk(tree, last.right, page, (lo, bounds.1), height - 1, out);
        }
    }
}

fn check(tree: &mut BTree, inserted: &[Key]) {
    let meta = tree.meta();
    let height = tree.height().unwrap();
    let mut out = Walk {
        nodes: 0,
        leaves: Vec::new(),
        keys: Vec::new(),
    };
    walk(tree, meta.root, NO_PAGE, (None, None), height, &mut out);

    let mut expected = inserted.to_vec();
    expected.sort_unstable();
    assert_eq!(out.keys, expected);
    assert_eq!(out.nodes, meta.node_count as usize);

    let mut chain = Vec::new();
    let mut page = meta.first_leaf;
    while page != NO_PAGE {
        chain.push(page);
        page = match tree.read_node(page).unwrap() {
            Node::Leaf(leaf) => leaf.next(),
            Node::Internal(_) => panic!("leaf chain reached internal page {}", page),
        };
    }
    assert_eq!(chain, out.leaves);
}

fn payload(key: Key, size: usize) -> Vec<u8> {
    let mut payload = vec![0xA5; size];
    let n = size.min(4);
    payload[..n].copy_from_slice(&key.to_le_bytes()[..n]);
    payload
}

fn run(config: TreeConfig, keys: &[Key]) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let mut tree = BTree::open_or_create(dir.path().join("tree.db"), config).unwrap();
    let size = config.payload_size;

    let mut height = 0;
    for (i, key) in keys.iter().enumerate() {
        tree.insert(*key, &payload(*key, size)).unwrap();
        let now = tree.height().unwrap();
        assert!(now == height || now == height + 1, "height jumped to {}", now);
        height = now;
        if i % 50 == 0 {
            check(&mut tree, &keys[..=i]);
        }
    }
    check(&mut tree, keys);
    for key in keys {
        assert_eq!(tree.search(*key).unwrap(), Some(payload(*key, size)));
    }
}

#[test]
fn ascending_small_fanout() {
    let keys: Vec<Key> = (1..=500).collect();
    run(TreeConfig::new(520).with_max_internal_cells(3), &keys);
}

#[test]
fn descending_small_fanout() {
    let keys: Vec<Key> = (1..=500).rev().collect();
    run(TreeConfig::new(520).with_max_internal_cells(3), &keys);
}

#[test]
fn random_orders() {
    for seed in 0..5 {
        let mut keys: Vec<Key> = (0..400).map(|k| k * 7 + 1).collect();
        keys.shuffle(&mut StdRng::seed_from_u64(seed));
        run(TreeConfig::new(520).with_max_internal_cells(3), &keys);
    }
}

#[test]
fn random_wide_nodes() {
    let mut keys: Vec<Key> = (0..5000).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(42));
    run(TreeConfig::new(8).with_max_internal_cells(16), &keys);
}

#[test]
fn tiny_payloads_default_fanout() {
    let mut keys: Vec<Key> = (0..3000).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(7));
    run(TreeConfig::new(1), &keys);
}

#[test]
fn extreme_keys() {
    let keys = [u32::MAX, 0, u32::MAX - 1, 1, u32::MAX / 2, 2, 3, 4, 5, 6, 7];
    run(TreeConfig::new(520).with_max_internal_cells(2), &keys);
}
