//! # Hash Viewer
//!
//! Enforces key uniqueness and O(1) lookup through a persisted
//! open-addressed hash table. The table is itself a row sequence of
//! *slot rows* carrying two integer cells `_H` (hash) and `_R` (base row),
//! sized `2^k + 1`: `2^k` slots plus one trailer row whose `_H` cell holds
//! the probe polynomial and whose `_R` cell holds the tombstone count.
//!
//! ## Slot States
//!
//! | `_H` | `_R` | meaning |
//! |------|------|---------|
//! | 0 | -1 | empty (never used since the last resize) |
//! | -1 | -1 | tombstone (free for insert, does not stop a probe) |
//! | hash | row | occupied |
//!
//! ## Probing
//!
//! Open addressing cycles through GF(2^k)-{0}: the increment is doubled
//! each miss and folded with an irreducible polynomial when it overflows
//! the mask, which visits every slot exactly once per period. The hash
//! function, polynomial table, and slot conventions are part of the
//! persisted format and must not change.
//!
//! ## The Key-Mutation Cascade
//!
//! Writing a key cell can *delete a row*: if the new key collides with
//! another row, that row is removed to preserve uniqueness, and the
//! mutated row's index shifts down when the victim preceded it. A caller
//! iterating the columns of one row must re-resolve the row index after
//! each key-column write.

use std::cmp::Ordering;

use eyre::Result;

use crate::store::{CellBuf, Cursor, Row, View};
use crate::types::{DataType, Property, Value};

use super::{key_usable, Lookup, Viewer};

/// Name of the slot-hash property.
const HASH_PROP: &str = "_H";

/// Name of the slot-row property.
const ROW_PROP: &str = "_R";

/// Irreducible polynomials over GF(2) to cycle through GF(2^k)-{0},
/// for table sizes 2^k, k = 2..=30.
const POLYS: [i64; 29] = [
    4 + 3,
    8 + 3,
    16 + 3,
    32 + 5,
    64 + 3,
    128 + 3,
    256 + 29,
    512 + 17,
    1024 + 9,
    2048 + 5,
    4096 + 83,
    8192 + 27,
    16384 + 43,
    32768 + 3,
    65536 + 45,
    131072 + 9,
    262144 + 39,
    524288 + 39,
    1048576 + 9,
    2097152 + 5,
    4194304 + 3,
    8388608 + 33,
    16777216 + 27,
    33554432 + 9,
    67108864 + 71,
    134217728 + 39,
    268435456 + 9,
    536870912 + 5,
    1073741824 + 83,
];

/// Viewer that keeps base rows unique on their leading key columns.
#[derive(Debug, Clone)]
pub struct HashViewer {
    base: View,
    map: View,
    num_keys: usize,
    hash_col: usize,
    row_col: usize,
}

impl HashViewer {
    pub(crate) fn new(base: View, num_keys: usize, map: Option<View>) -> Result<HashViewer> {
        eyre::ensure!(num_keys > 0, "hash view needs at least one key column");

        let map = map.unwrap_or_else(Self::map_template);
        let hash_col = map
            .find_property(HASH_PROP)
            .ok_or_else(|| eyre::eyre!("hash map lacks the {} property", HASH_PROP))?;
        let row_col = map
            .find_property(ROW_PROP)
            .ok_or_else(|| eyre::eyre!("hash map lacks the {} property", ROW_PROP))?;
        eyre::ensure!(
            map.nth_property(hash_col)?.data_type() == DataType::Int
                && map.nth_property(row_col)?.data_type() == DataType::Int,
            "hash map slot properties must be integers"
        );

        let mut viewer = HashViewer {
            base,
            map,
            num_keys,
            hash_col,
            row_col,
        };

        if viewer.map.size() == 0 {
            viewer.map.set_size(1)?;
        }

        if viewer.poly()? == 0 || viewer.map.size() <= viewer.base.size() {
            viewer.resize_table(viewer.base.size())?;
        }

        // a wrong slot count would make the probe cycle undefined
        let slots = viewer.map.size() - 1;
        eyre::ensure!(
            slots >= 4 && slots.is_power_of_two(),
            "hash map has a malformed slot count {}",
            slots
        );

        Ok(viewer)
    }

    /// Empty sequence with the slot-table schema.
    pub fn map_template() -> View {
        View::with_properties(vec![Property::int(HASH_PROP), Property::int(ROW_PROP)])
    }

    /// The slot table; exposed so hosts can persist it alongside the base.
    pub fn map(&self) -> &View {
        &self.map
    }

    fn int_at(&self, row: usize, col: usize) -> Result<i64> {
        self.map
            .value(row, col)?
            .as_int()
            .ok_or_else(|| eyre::eyre!("hash map cell is not an integer"))
    }

    fn poly(&self) -> Result<i64> {
        self.int_at(self.map.size() - 1, self.hash_col)
    }

    fn set_poly(&self, v: i64) -> Result<()> {
        self.map
            .set_value(self.map.size() - 1, self.hash_col, Value::Int(v))
    }

    fn spare(&self) -> Result<i64> {
        self.int_at(self.map.size() - 1, self.row_col)
    }

    fn set_spare(&self, v: i64) -> Result<()> {
        self.map
            .set_value(self.map.size() - 1, self.row_col, Value::Int(v))
    }

    fn slot_hash(&self, slot: usize) -> Result<i32> {
        Ok(self.int_at(slot, self.hash_col)? as i32)
    }

    fn slot_row(&self, slot: usize) -> Result<i64> {
        self.int_at(slot, self.row_col)
    }

    fn set_slot(&self, slot: usize, hash: Option<i32>, row: i64) -> Result<()> {
        if let Some(h) = hash {
            self.map
                .set_value(slot, self.hash_col, Value::Int(h as i64))?;
        }
        self.map.set_value(slot, self.row_col, Value::Int(row))
    }

    /// Compares base row `row` against the key, column by column.
    fn key_same(&self, row: usize, key: &Cursor) -> Result<bool> {
        for i in 0..self.num_keys {
            let image = self.base.cell(row, i)?;
            let ord = key.container().handler(i)?.compare(key.row(), &image)?;
            if ord != Ordering::Equal {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Hashes the leading key cells of the cursor's row.
    ///
    /// Only the first and last 100 bytes of a cell longer than 200 bytes
    /// are scanned, bounding the cost on blob keys while staying sensitive
    /// to length and endpoints. The result is persisted, so the exact
    /// arithmetic (32-bit signed wrapping) must stay stable.
    fn hash_of(&self, key: &Cursor) -> Result<i32> {
        let mut hash: i32 = 0;

        for i in 0..self.num_keys {
            let buffer = key.cell(i)?;
            let size = buffer.len();
            if size > 0 {
                let mut x: i32 = (buffer[0] as i32) << 7;

                let head = if size > 200 { 100 } else { size };
                for &b in &buffer[..head] {
                    x = x.wrapping_mul(1_000_003) ^ b as i32;
                }
                if size > 200 {
                    for &b in &buffer[size - 100..] {
                        x = x.wrapping_mul(1_000_003) ^ b as i32;
                    }
                }

                x ^= size as i32;
                hash ^= x ^ i as i32;
            }
        }

        // 0 is reserved for empty slots
        Ok(if hash == 0 { -1 } else { hash })
    }

    /// Probes for the key. Returns the slot holding it, or the slot where
    /// it belongs: the first tombstone seen, else the empty slot that
    /// terminated the probe.
    fn look_dict(&self, hash: i32, key: &Cursor) -> Result<usize> {
        let mask = (self.map.size() - 2) as u32;

        // start from the complement; degenerate integer hashes have lots
        // of leading zeros
        let mut i = (mask & !(hash as u32)) as usize;

        let h = self.slot_hash(i)?;
        if h == 0 {
            return Ok(i);
        }
        if h == hash {
            let r = self.slot_row(i)?;
            if r >= 0 && self.key_same(r as usize, key)? {
                return Ok(i);
            }
        }
        let mut freeslot = if h == -1 { Some(i) } else { None };

        // the increment must never be zero
        let mut incr = ((hash as u32) ^ ((hash as u32) >> 3)) & mask;
        if incr == 0 {
            incr = mask;
        }

        let poly = self.poly()? as u32;
        loop {
            i = ((i as u32 + incr) & mask) as usize;
            let h = self.slot_hash(i)?;
            if h == 0 {
                return Ok(freeslot.unwrap_or(i));
            }
            if h == hash {
                let r = self.slot_row(i)?;
                if r >= 0 && self.key_same(r as usize, key)? {
                    return Ok(i);
                }
            }
            if h == -1 && freeslot.is_none() {
                freeslot = Some(i);
            }
            // cycle through GF(2^k)-{0}; the fold clears the high bit
            incr <<= 1;
            if incr > mask {
                incr ^= poly;
            }
        }
    }

    /// Claims a slot for base row `row`.
    fn insert_dict(&mut self, row: usize) -> Result<()> {
        let cursor = self.base.cursor(row);
        let hash = self.hash_of(&cursor)?;
        let slot = self.look_dict(hash, &cursor)?;

        if self.slot_row(slot)? == -1 {
            if self.slot_hash(slot)? != 0 {
                // reusing a tombstone
                let n = self.spare()?;
                eyre::ensure!(n > 0, "tombstone accounting underflow");
                self.set_spare(n - 1)?;
            }
            self.set_slot(slot, Some(hash), row as i64)?;
        } else {
            self.set_slot(slot, None, row as i64)?;
        }
        Ok(())
    }

    /// Tombstones the slot of base row `pos`.
    fn remove_dict(&mut self, pos: usize) -> Result<()> {
        let key = self.base.cursor(pos);
        let hash = self.hash_of(&key)?;
        let slot = self.look_dict(hash, &key)?;
        eyre::ensure!(
            self.slot_row(slot)? == pos as i64,
            "hash slot does not name the row being removed"
        );

        self.set_slot(slot, Some(-1), -1)?;
        self.set_spare(self.spare()? + 1)
    }

    /// Rebuilds the table at the smallest power-of-two size above
    /// `minused`, clearing tombstones and re-inserting every base row.
    /// Fails, leaving the map unchanged, when 2^30 would not suffice.
    fn resize_table(&mut self, minused: usize) -> Result<()> {
        let mut idx = 0;
        let mut size: usize = 4;
        while size <= minused {
            idx += 1;
            eyre::ensure!(idx < POLYS.len(), "hash map cannot grow past 2^30 slots");
            size <<= 1;
        }
        let poly = POLYS[idx];

        self.map.set_size(1)?;
        let empty = Row::new()
            .with(Property::int(HASH_PROP), Value::Int(0))
            .with(Property::int(ROW_PROP), Value::Int(-1));
        self.map.insert_rows(0, &empty, size)?;

        self.set_poly(poly)?;
        self.set_spare(0)?;

        for row in 0..self.base.size() {
            self.insert_dict(row)?;
        }
        Ok(())
    }
}

impl Viewer for HashViewer {
    fn template(&self) -> Result<View> {
        Ok(self.base.template())
    }

    fn size(&self) -> usize {
        self.base.size()
    }

    fn lookup(&self, key: &Cursor) -> Result<Lookup> {
        if !key_usable(&self.base, key, self.num_keys)? {
            return Ok(Lookup::Unusable);
        }

        let hash = self.hash_of(key)?;
        let slot = self.look_dict(hash, key)?;

        let row = self.slot_row(slot)?;
        if row >= 0 && self.key_same(row as usize, key)? {
            Ok(Lookup::Hit { row: row as usize })
        } else {
            // the probe is authoritative: the key is not there
            Ok(Lookup::Miss { pos: 0 })
        }
    }

    fn get(&self, row: usize, col: usize) -> Result<CellBuf> {
        self.base.cell(row, col)
    }

    /// Writing a key cell to a value another row already carries deletes
    /// that other row to preserve uniqueness, and shifts this row's index
    /// down by one when the victim preceded it.
    fn set(&mut self, row: usize, col: usize, image: &[u8]) -> Result<()> {
        if col < self.num_keys {
            let old = self.base.cell(row, col)?;
            if old[..] == *image {
                return Ok(());
            }
            self.remove_dict(row)?;
        }

        self.base.set_cell(row, col, image)?;

        if col < self.num_keys {
            let mut row = row;
            // this row's slot is gone, so a hit can only name another row
            if let Lookup::Hit { row: other } = self.lookup(&self.base.cursor(row))? {
                self.remove(other, 1)?;
                if other < row {
                    row -= 1;
                }
            }
            self.insert_dict(row)?;
        }

        Ok(())
    }

    /// An exact key match replaces the existing row in place, so inserts
    /// deduplicate; multi-row inserts collapse to one row.
    fn insert(&mut self, pos: usize, value: &Cursor, count: usize) -> Result<()> {
        eyre::ensure!(count > 0, "insert count must be positive");

        match self.lookup(value)? {
            Lookup::Unusable => {
                eyre::bail!("insert value lacks the key columns of the hash view")
            }
            Lookup::Hit { row } => {
                return self.base.set_row(row, &value.fetch_row()?);
            }
            Lookup::Miss { .. } => {}
        }

        let used = self.base.size();
        let fill = used as i64 + self.spare()?;
        if fill * 3 >= (self.map.size() as i64 - 1) * 2 {
            self.resize_table(used * 2)?;
        }

        if pos < used {
            // the insertion shifts the base rows above it
            for slot in 0..self.map.size() - 1 {
                let n = self.slot_row(slot)?;
                if n >= pos as i64 {
                    self.set_slot(slot, None, n + 1)?;
                }
            }
        }

        self.base.insert_rows(pos, &value.fetch_row()?, 1)?;
        self.insert_dict(pos)
    }

    fn remove(&mut self, pos: usize, count: usize) -> Result<()> {
        for _ in 0..count {
            // the map persists, so shrink it aggressively as it empties
            if self.base.size() * 3 < self.map.size() - 1 {
                self.resize_table(self.base.size())?;
            }

            self.remove_dict(pos)?;

            for slot in 0..self.map.size() - 1 {
                let n = self.slot_row(slot)?;
                if n > pos as i64 {
                    self.set_slot(slot, None, n - 1)?;
                }
            }

            self.base.remove_rows(pos, 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer() -> HashViewer {
        let base = View::with_properties(vec![Property::int("k"), Property::bytes("v")]);
        HashViewer::new(base, 1, None).unwrap()
    }

    fn value(k: i64, v: &[u8]) -> Cursor {
        Row::new()
            .with(Property::int("k"), Value::Int(k))
            .with(Property::bytes("v"), Value::Bytes(v.to_vec()))
            .into_cursor()
    }

    fn bytes_key(bytes: Vec<u8>) -> Cursor {
        Row::new()
            .with(Property::bytes("k"), Value::Bytes(bytes))
            .into_cursor()
    }

    #[test]
    fn polynomials_generate_full_period() {
        // multiplying by x must cycle through all of GF(2^k)-{0}
        for (idx, &poly) in POLYS.iter().take(9).enumerate() {
            let k = idx + 2;
            let mask = (1u32 << k) - 1;
            let mut incr = 1u32;
            let mut period = 0u32;
            loop {
                incr <<= 1;
                if incr > mask {
                    incr ^= poly as u32;
                }
                assert_ne!(incr, 0, "poly for k={} collapsed the increment", k);
                period += 1;
                if incr == 1 {
                    break;
                }
            }
            assert_eq!(period, (1 << k) - 1, "poly for k={} is not primitive", k);
        }
    }

    #[test]
    fn hash_is_deterministic_and_nonzero() {
        let v = viewer();
        let a = v.hash_of(&value(12345, b"x")).unwrap();
        let b = v.hash_of(&value(12345, b"y")).unwrap();
        assert_eq!(a, b, "hash covers key columns only");
        assert_ne!(a, 0);

        let c = v.hash_of(&value(12346, b"x")).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn empty_key_cell_hashes_to_minus_one() {
        let base = View::with_properties(vec![Property::bytes("k")]);
        let v = HashViewer::new(base, 1, None).unwrap();
        assert_eq!(v.hash_of(&bytes_key(Vec::new())).unwrap(), -1);
    }

    #[test]
    fn mid_sized_keys_hash_every_byte() {
        let base = View::with_properties(vec![Property::bytes("k")]);
        let v = HashViewer::new(base, 1, None).unwrap();

        let mut a = vec![7u8; 150];
        let mut b = a.clone();
        b[120] ^= 1;
        assert_ne!(
            v.hash_of(&bytes_key(a.clone())).unwrap(),
            v.hash_of(&bytes_key(b)).unwrap()
        );

        // beyond 200 bytes only the first and last 100 count
        a.resize(250, 7);
        let mut c = a.clone();
        c[120] ^= 1;
        assert_eq!(
            v.hash_of(&bytes_key(a.clone())).unwrap(),
            v.hash_of(&bytes_key(c)).unwrap()
        );
        let mut d = a.clone();
        d[249] ^= 1;
        assert_ne!(
            v.hash_of(&bytes_key(a)).unwrap(),
            v.hash_of(&bytes_key(d)).unwrap()
        );
    }

    #[test]
    fn fresh_map_has_minimum_shape() {
        let v = viewer();
        assert_eq!(v.map.size(), 5); // 2^2 slots + trailer
        assert_ne!(v.poly().unwrap(), 0);
        assert_eq!(v.spare().unwrap(), 0);
    }

    #[test]
    fn insert_lookup_remove_round_trip() {
        let mut v = viewer();
        v.insert(0, &value(10, b"ten"), 1).unwrap();
        v.insert(1, &value(20, b"twenty"), 1).unwrap();

        let key = Row::new()
            .with(Property::int("k"), Value::Int(20))
            .into_cursor();
        assert_eq!(v.lookup(&key).unwrap(), Lookup::Hit { row: 1 });

        v.remove(1, 1).unwrap();
        assert_eq!(v.lookup(&key).unwrap(), Lookup::Miss { pos: 0 });
        assert_eq!(v.size(), 1);
    }

    #[test]
    fn tombstones_are_counted() {
        let mut v = viewer();
        v.insert(0, &value(1, b"a"), 1).unwrap();
        v.insert(1, &value(2, b"b"), 1).unwrap();
        v.insert(2, &value(3, b"c"), 1).unwrap();
        v.remove(2, 1).unwrap();
        assert_eq!(v.spare().unwrap(), 1);

        let tombstones = (0..v.map.size() - 1)
            .filter(|&s| v.slot_hash(s).unwrap() == -1)
            .count();
        assert_eq!(tombstones, 1);

        // the next insert trips the fill check; the rebuild clears spares
        v.insert(2, &value(3, b"again"), 1).unwrap();
        assert_eq!(v.spare().unwrap(), 0);
    }

    #[test]
    fn foreign_key_schema_is_unusable() {
        let v = viewer();
        let key = Row::new()
            .with(Property::int("other"), Value::Int(1))
            .into_cursor();
        assert_eq!(v.lookup(&key).unwrap(), Lookup::Unusable);
    }

    #[test]
    fn persisted_map_is_adopted_without_rebuild() {
        let base = View::with_properties(vec![Property::int("k"), Property::bytes("v")]);
        let map = HashViewer::map_template();
        {
            let mut v = HashViewer::new(base.clone(), 1, Some(map.clone())).unwrap();
            for i in 0..10 {
                v.insert(v.size(), &value(i, b"x"), 1).unwrap();
            }
        }
        // a new viewer over the same sequences sees the persisted slots
        let v = HashViewer::new(base, 1, Some(map)).unwrap();
        for i in 0..10 {
            let key = Row::new()
                .with(Property::int("k"), Value::Int(i))
                .into_cursor();
            assert_eq!(v.lookup(&key).unwrap(), Lookup::Hit { row: i as usize });
        }
    }
}
