#![allow(missing_docs)]

use bptree_node::{
    decode, estimate_size, InternalEntry, LeafEntry, MemPageStore, Node, NodeCodec, NodeKind,
    PageError, PageId, PageStore, PagerOptions, Result,
};

fn leaf(keys: &[&str]) -> Node {
    Node::Leaf(
        keys.iter()
            .map(|k| LeafEntry::new(k.as_bytes(), format!("value-{k}").into_bytes()))
            .collect(),
    )
}

#[test]
fn nodes_survive_a_trip_through_the_store() -> Result<()> {
    let store = MemPageStore::new(PagerOptions::default());
    let codec = NodeCodec::default();

    let left = leaf(&["apple", "banana"]);
    let right = leaf(&["mango", "pear"]);
    let left_id = store.allocate()?;
    let right_id = store.allocate()?;
    store.write(left_id, &codec.encode(&left)?)?;
    store.write(right_id, &codec.encode(&right)?)?;

    let root = Node::Internal(vec![
        InternalEntry::new(&b"apple"[..], left_id),
        InternalEntry::new(&b"mango"[..], right_id),
    ]);
    let root_id = store.allocate()?;
    store.write(root_id, &codec.encode(&root)?)?;

    let root_page = store.read(root_id)?;
    let root_node = codec.decode(&root_page)?;
    assert_eq!(root_node.kind(), NodeKind::Internal);
    let slot = match root_node.search(b"pear") {
        Ok(idx) => idx,
        Err(idx) => idx - 1,
    };
    let child_page = store.read(root_node.child(slot))?;
    let child = codec.decode(&child_page)?;
    let idx = child.search(b"pear").expect("pear stored in right leaf");
    assert_eq!(child.value(idx), b"value-pear");
    assert_eq!(child.to_node(), right);

    let snap = codec.stats().snapshot();
    assert_eq!(snap.encodes, 3);
    assert_eq!(snap.decodes, 2);
    assert_eq!(
        snap.bytes_encoded as usize,
        estimate_size(&left) + estimate_size(&right) + estimate_size(&root)
    );
    Ok(())
}

#[test]
fn store_hands_back_what_decode_rejects() -> Result<()> {
    let store = MemPageStore::default();
    let id = store.allocate()?;
    let mut raw = vec![0u8; store.page_size()];
    raw[0] = 0xFF;
    store.write(id, &raw)?;
    let page = store.read(id)?;
    assert!(decode(&page).unwrap_err().is_malformed());
    Ok(())
}

#[test]
fn freed_pages_are_gone() -> Result<()> {
    let store = MemPageStore::default();
    let id = store.allocate()?;
    store.free(id)?;
    assert!(matches!(store.read(id), Err(PageError::NotFound(PageId(1)))));
    assert!(store.is_empty());
    Ok(())
}
