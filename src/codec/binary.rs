//! Compact little-endian encoding.
//!
//! ```text
//! u16 version | u8 object tag | u32 len | algorithm name | body
//!
//! tree body  = option<u32 root> | vec<u32 leaf> | vec<node>
//! node       = digest | option<u32 len | payload> | vec<u32 child>
//! proof body = vec<u32 index> | digest expected | vec<vec<slot>>
//!              | vec<leaf> original | vec<leaf> working
//! slot       = 0 digest | 1 u32 position | 2
//! leaf       = option<u32 len | payload> | digest
//! ```
//!
//! Digests are written without a length prefix; their width is fixed by the
//! algorithm in the header. Vectors carry a `u32` item count and options a
//! `u8` presence flag.

use super::record::{
    check_version, HexBytes, LeafRecord, NodeRecord, ProofRecord, SlotRecord, TreeRecord,
};
use super::FORMAT_VERSION;
use crate::ser::{ByteReader, ByteWriter, SerError, SerKind, SerResult};

pub(crate) const TREE_TAG: u8 = 1;
pub(crate) const PROOF_TAG: u8 = 2;

const SLOT_SIBLING: u8 = 0;
const SLOT_LEAF: u8 = 1;
const SLOT_CHILD: u8 = 2;

fn write_header(out: &mut ByteWriter, tag: u8, algorithm: &str) -> SerResult<()> {
    out.put_u16(FORMAT_VERSION);
    out.put_u8(tag);
    out.put_str(algorithm, SerKind::Header, "algorithm")
}

/// Reads the header, returning the algorithm name it carries.
pub(crate) fn read_header(cursor: &mut ByteReader<'_>, tag: u8) -> SerResult<String> {
    let version = cursor.read_u16(SerKind::Header, "version")?;
    check_version(version, SerKind::Header)?;
    if cursor.read_u8(SerKind::Header, "tag")? != tag {
        return Err(SerError::invalid_value(SerKind::Header, "tag"));
    }
    cursor.read_str(SerKind::Header, "algorithm")
}

fn write_payload(out: &mut ByteWriter, payload: Option<&HexBytes>, kind: SerKind) -> SerResult<()> {
    out.put_option(payload, |out, HexBytes(bytes)| {
        out.put_prefixed(bytes, kind, "payload")
    })
}

fn read_payload(cursor: &mut ByteReader<'_>, kind: SerKind) -> SerResult<Option<HexBytes>> {
    cursor.read_option(kind, "payload", |cursor| {
        cursor.read_prefixed(kind, "payload").map(HexBytes)
    })
}

fn write_indices(
    out: &mut ByteWriter,
    items: &[u32],
    kind: SerKind,
    field: &'static str,
) -> SerResult<()> {
    out.put_seq(items, kind, field, |out, &item| {
        out.put_u32(item);
        Ok(())
    })
}

fn read_indices(
    cursor: &mut ByteReader<'_>,
    kind: SerKind,
    field: &'static str,
) -> SerResult<Vec<u32>> {
    cursor.read_seq(kind, field, |cursor| cursor.read_u32(kind, field))
}

pub(crate) fn encode_tree(record: &TreeRecord, width: usize) -> SerResult<Vec<u8>> {
    let mut out = ByteWriter::new();
    write_header(&mut out, TREE_TAG, &record.algorithm)?;
    out.put_option(record.root.as_ref(), |out, &root| {
        out.put_u32(root);
        Ok(())
    })?;
    write_indices(&mut out, &record.leaves, SerKind::Tree, "leaves")?;
    out.put_seq(&record.nodes, SerKind::Tree, "nodes", |out, node| {
        out.put_digest(&node.digest, width, SerKind::Node, "digest")?;
        write_payload(out, node.payload.as_ref(), SerKind::Node)?;
        write_indices(out, &node.children, SerKind::Node, "children")
    })?;
    Ok(out.into_bytes())
}

/// Decodes a tree record whose digests are `width` bytes wide.
pub(crate) fn decode_tree(bytes: &[u8], width: usize) -> SerResult<TreeRecord> {
    let mut cursor = ByteReader::new(bytes);
    let algorithm = read_header(&mut cursor, TREE_TAG)?;
    let root = cursor.read_option(SerKind::Tree, "root", |cursor| {
        cursor.read_u32(SerKind::Tree, "root")
    })?;
    let leaves = read_indices(&mut cursor, SerKind::Tree, "leaves")?;
    let nodes = cursor.read_seq(SerKind::Tree, "nodes", |cursor| {
        Ok(NodeRecord {
            digest: cursor.read_digest(width, SerKind::Node, "digest")?,
            payload: read_payload(cursor, SerKind::Node)?,
            children: read_indices(cursor, SerKind::Node, "children")?,
        })
    })?;
    cursor.finish(SerKind::Tree)?;
    Ok(TreeRecord {
        version: FORMAT_VERSION,
        algorithm,
        root,
        leaves,
        nodes,
    })
}

fn write_leaves(
    out: &mut ByteWriter,
    leaves: &[LeafRecord],
    width: usize,
    field: &'static str,
) -> SerResult<()> {
    out.put_seq(leaves, SerKind::Proof, field, |out, leaf| {
        write_payload(out, leaf.payload.as_ref(), SerKind::ProofLeaf)?;
        out.put_digest(&leaf.digest, width, SerKind::ProofLeaf, "digest")
    })
}

fn read_leaves(
    cursor: &mut ByteReader<'_>,
    width: usize,
    field: &'static str,
) -> SerResult<Vec<LeafRecord>> {
    cursor.read_seq(SerKind::Proof, field, |cursor| {
        Ok(LeafRecord {
            payload: read_payload(cursor, SerKind::ProofLeaf)?,
            digest: cursor.read_digest(width, SerKind::ProofLeaf, "digest")?,
        })
    })
}

fn write_slot(out: &mut ByteWriter, slot: &SlotRecord, width: usize) -> SerResult<()> {
    match slot {
        SlotRecord::Sibling(digest) => {
            out.put_u8(SLOT_SIBLING);
            out.put_digest(digest, width, SerKind::ProofStep, "sibling")
        }
        SlotRecord::Leaf(position) => {
            out.put_u8(SLOT_LEAF);
            out.put_u32(*position);
            Ok(())
        }
        SlotRecord::Child => {
            out.put_u8(SLOT_CHILD);
            Ok(())
        }
    }
}

fn read_slot(cursor: &mut ByteReader<'_>, width: usize) -> SerResult<SlotRecord> {
    match cursor.read_u8(SerKind::ProofStep, "slot")? {
        SLOT_SIBLING => cursor
            .read_digest(width, SerKind::ProofStep, "sibling")
            .map(SlotRecord::Sibling),
        SLOT_LEAF => cursor
            .read_u32(SerKind::ProofStep, "leaf")
            .map(SlotRecord::Leaf),
        SLOT_CHILD => Ok(SlotRecord::Child),
        _ => Err(SerError::invalid_value(SerKind::ProofStep, "slot")),
    }
}

pub(crate) fn encode_proof(record: &ProofRecord, width: usize) -> SerResult<Vec<u8>> {
    let mut out = ByteWriter::new();
    write_header(&mut out, PROOF_TAG, &record.algorithm)?;
    write_indices(&mut out, &record.indices, SerKind::Proof, "indices")?;
    out.put_digest(&record.expected, width, SerKind::Proof, "expected")?;
    out.put_seq(&record.steps, SerKind::Proof, "steps", |out, step| {
        out.put_seq(step, SerKind::ProofStep, "slots", |out, slot| {
            write_slot(out, slot, width)
        })
    })?;
    write_leaves(&mut out, &record.original, width, "original")?;
    write_leaves(&mut out, &record.working, width, "working")?;
    Ok(out.into_bytes())
}

/// Decodes a proof record whose digests are `width` bytes wide.
pub(crate) fn decode_proof(bytes: &[u8], width: usize) -> SerResult<ProofRecord> {
    let mut cursor = ByteReader::new(bytes);
    let algorithm = read_header(&mut cursor, PROOF_TAG)?;
    let indices = read_indices(&mut cursor, SerKind::Proof, "indices")?;
    let expected = cursor.read_digest(width, SerKind::Proof, "expected")?;
    let steps = cursor.read_seq(SerKind::Proof, "steps", |cursor| {
        cursor.read_seq(SerKind::ProofStep, "slots", |cursor| read_slot(cursor, width))
    })?;
    let original = read_leaves(&mut cursor, width, "original")?;
    let working = read_leaves(&mut cursor, width, "working")?;
    cursor.finish(SerKind::Proof)?;
    Ok(ProofRecord {
        version: FORMAT_VERSION,
        algorithm,
        indices,
        expected,
        steps,
        original,
        working,
    })
}
