#![allow(missing_docs)]

use std::sync::{Arc, Once};

use bptree_node::storage::node::layout::{tables_len, MAX_SINGLE_ENTRY_NODE};
use bptree_node::{
    decode, encode, CodecOptions, LeafEntry, Node, NodeCodec, NodeKind, NodePage, PageError,
    Result, MAX_KEY_SIZE, MAX_VALUE_SIZE, PAGE_SIZE,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("bptree_node=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

fn cat_dog() -> Node {
    Node::Leaf(vec![
        LeafEntry::new(&b"cat"[..], &b"meow"[..]),
        LeafEntry::new(&b"dog"[..], &b"bark"[..]),
    ])
}

fn single(key_len: usize, value_len: usize) -> Node {
    Node::Leaf(vec![LeafEntry::new(
        vec![b'k'; key_len],
        vec![b'v'; value_len],
    )])
}

#[test]
fn cat_and_dog_leaf_layout() -> Result<()> {
    init_tracing();
    let buf = encode(&cat_dog())?;
    let page = NodePage::new(&buf[..]);
    assert_eq!(page.kind()?, NodeKind::Leaf);
    assert_eq!(page.key_count(), 2);
    assert_eq!(page.key(0), b"cat");
    assert_eq!(page.value(1), b"bark");
    assert_eq!(page.size(), tables_len(2) + (4 + 3 + 4) + (4 + 3 + 4));
    assert_eq!(page.size(), 4 + 2 * 8 + 2 * 2 + 22);

    let decoded = decode(&buf)?;
    let pairs: Vec<(&[u8], &[u8])> = decoded.iter().map(|e| (e.key, e.value)).collect();
    assert_eq!(pairs, vec![(&b"cat"[..], &b"meow"[..]), (&b"dog"[..], &b"bark"[..])]);
    assert_eq!(decoded.to_node(), cat_dog());
    Ok(())
}

#[test]
fn maximal_entry_fits_exactly() -> Result<()> {
    init_tracing();
    let buf = encode(&single(MAX_KEY_SIZE, MAX_VALUE_SIZE))?;
    let node = decode(&buf)?;
    assert_eq!(node.size(), MAX_SINGLE_ENTRY_NODE);
    assert!(node.size() <= PAGE_SIZE);
    assert_eq!(node.key(0).len(), MAX_KEY_SIZE);
    assert_eq!(node.value(0).len(), MAX_VALUE_SIZE);
    Ok(())
}

#[test]
fn one_byte_past_either_limit_is_capacity_exceeded() {
    init_tracing();
    let codec = NodeCodec::default();
    let err = codec
        .encode(&single(MAX_KEY_SIZE + 1, MAX_VALUE_SIZE))
        .unwrap_err();
    assert!(matches!(err, PageError::CapacityExceeded { what: "key", .. }));
    let err = codec
        .encode(&single(MAX_KEY_SIZE, MAX_VALUE_SIZE + 1))
        .unwrap_err();
    assert!(matches!(err, PageError::CapacityExceeded { what: "value", .. }));
    assert_eq!(codec.stats().capacity_rejections(), 2);
    codec.stats().emit_tracing();
}

#[test]
fn two_maximal_entries_do_not_share_a_page() {
    let node = Node::Leaf(vec![
        LeafEntry::new(vec![1u8; MAX_KEY_SIZE], vec![0u8; MAX_VALUE_SIZE]),
        LeafEntry::new(vec![2u8; MAX_KEY_SIZE], vec![0u8; MAX_VALUE_SIZE]),
    ]);
    let err = encode(&node).unwrap_err();
    assert!(matches!(
        err,
        PageError::CapacityExceeded {
            what: "node",
            limit: PAGE_SIZE,
            ..
        }
    ));
}

#[test]
fn declared_size_past_buffer_is_malformed() -> Result<()> {
    init_tracing();
    let buf = encode(&cat_dog())?;
    let size = NodePage::new(&buf[..]).size();
    let err = decode(&buf[..size - 1]).unwrap_err();
    assert!(matches!(err, PageError::Malformed(_)));

    // inflate the final offset so the node claims more than the page holds
    let mut forged = buf.clone();
    NodePage::new(&mut forged[..]).set_offset(2, u16::MAX);
    assert!(decode(&forged).unwrap_err().is_malformed());
    Ok(())
}

#[test]
fn unknown_type_is_malformed() -> Result<()> {
    let mut buf = encode(&cat_dog())?;
    buf[0] = 9;
    assert!(matches!(
        decode(&buf).unwrap_err(),
        PageError::Malformed("unknown node type")
    ));
    Ok(())
}

#[test]
#[should_panic(expected = "out of range")]
fn key_at_count_faults() {
    let buf = encode(&cat_dog()).expect("encode");
    let node = decode(&buf).expect("decode");
    let _ = node.key(2);
}

#[test]
#[should_panic(expected = "out of range")]
fn child_ref_at_count_faults() {
    let buf = encode(&cat_dog()).expect("encode");
    let _ = NodePage::new(&buf[..]).child_ref(2);
}

#[test]
fn offsets_past_count_fault() {
    let buf = encode(&cat_dog()).expect("encode");
    for k in 1..4 {
        let page = NodePage::new(&buf[..]);
        let outcome = std::panic::catch_unwind(move || page.offset(2 + k));
        assert!(outcome.is_err(), "offset({}) must fault", 2 + k);
    }
}

#[test]
fn sealed_page_serves_concurrent_readers() -> Result<()> {
    let codec = NodeCodec::new(CodecOptions::default());
    let entries: Vec<LeafEntry> = (0..100u16)
        .map(|i| LeafEntry::new(i.to_be_bytes().to_vec(), vec![i as u8; 20]))
        .collect();
    let page: Arc<[u8]> = Arc::from(codec.encode(&Node::Leaf(entries))?);

    std::thread::scope(|scope| {
        for t in 0..4u16 {
            let page = Arc::clone(&page);
            scope.spawn(move || {
                let node = decode(&page).expect("sealed page decodes");
                for i in (t..100).step_by(4) {
                    let idx = node.search(&i.to_be_bytes()).expect("key present");
                    assert_eq!(idx, i as usize);
                    assert_eq!(node.value(idx), &[i as u8; 20][..]);
                }
            });
        }
    });
    Ok(())
}
