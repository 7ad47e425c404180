use std::mem::size_of;

use super::node::{read_u32, write_u32, PageKind, PageNum, KIND_TAG, NO_PAGE};
use crate::{error::FormatError, Page};

/// Meta Page Layout
/// (<offset>, <size>)
const ROOT_PAGE: (usize, usize) = (KIND_TAG.0 + KIND_TAG.1, size_of::<PageNum>());
/// (<offset>, <size>)
const FIRST_LEAF: (usize, usize) = (ROOT_PAGE.0 + ROOT_PAGE.1, size_of::<PageNum>());
/// (<offset>, <size>)
const NODE_COUNT: (usize, usize) = (FIRST_LEAF.0 + FIRST_LEAF.1, size_of::<u32>());

pub const META_PAGE: PageNum = 0;

/// Contents of page 0.
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct TreeMeta {
    pub root: PageNum,
    /// Leftmost leaf, where a sequential scan would start.
    pub first_leaf: PageNum,
    /// Node pages allocated so far; the next one goes to `node_count + 1`.
    pub node_count: u32,
}

impl TreeMeta {
    pub fn is_empty(&self) -> bool {
        self.root == NO_PAGE
    }

    pub fn encode(&self) -> Page {
        let mut page = PageKind::Meta.blank_page();
        write_u32(&mut page[..], ROOT_PAGE.0, self.root);
        write_u32(&mut page[..], FIRST_LEAF.0, self.first_leaf);
        write_u32(&mut page[..], NODE_COUNT.0, self.node_count);
        page
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        PageKind::Meta.expect(bytes)?;
        Ok(Self {
            root: read_u32(bytes, ROOT_PAGE.0),
            first_leaf: read_u32(bytes, FIRST_LEAF.0),
            node_count: read_u32(bytes, NODE_COUNT.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let meta = TreeMeta::default();
        assert!(meta.is_empty());
        assert_eq!(TreeMeta::decode(&meta.encode()[..]), Ok(meta));
    }

    #[test]
    fn round_trip() {
        let meta = TreeMeta {
            root: 8,
            first_leaf: 1,
            node_count: 8,
        };
        assert!(!meta.is_empty());
        assert_eq!(TreeMeta::decode(&meta.encode()[..]), Ok(meta));
    }

    #[test]
    fn layout() {
        let page = TreeMeta {
            root: 0x0201,
            first_leaf: 3,
            node_count: 4,
        }
        .encode();
        assert_eq!(&page[..14], &[0xAB, 0xC0, 1, 2, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0]);
        assert!(page[14..].iter().all(|b| *b == 0));
    }

    #[test]
    fn rejects_node_page() {
        assert_eq!(
            TreeMeta::decode(&PageKind::Leaf.blank_page()[..]),
            Err(FormatError::KindTag {
                expected: PageKind::Meta,
                found: PageKind::Leaf
            })
        );
    }
}
