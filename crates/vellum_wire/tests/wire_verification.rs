//! # Wire Format Verification Tests
//!
//! These tests verify the engine's load-bearing laws end to end:
//!
//! 1. **Round-trip**: every field written is read back exactly, defaults included
//! 2. **Omission**: default-valued fields cost zero bytes
//! 3. **Compatibility**: additive schema evolution in both directions
//! 4. **Bounds**: hostile buffers fail loudly, never read out of range
//! 5. **Framing**: concatenated frames split back byte-identical
//!
//! Run with: cargo test --package vellum_wire --test wire_verification

use rand::{Rng, SeedableRng};
use vellum_wire::{frame, frame_into, read_frames, root_table, Builder, WireError};

// ============================================================================
// LAW 1: ROUND-TRIP
// ============================================================================

#[test]
fn verify_round_trip_randomized() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5EED);
    let mut builder = Builder::new();

    for _ in 0..200 {
        let a: u64 = rng.gen();
        let b: i32 = rng.gen();
        let c: f64 = rng.gen();
        let d: bool = rng.gen();

        builder.reset();
        builder.start_table(4);
        builder.push_slot_scalar(0, a, 0);
        builder.push_slot_scalar(1, b, 0);
        builder.push_slot_scalar(2, c, 0.0);
        builder.push_slot_scalar(3, d, false);
        let root = builder.end_table();
        builder.finish(root);

        let table = root_table(builder.finished_data()).unwrap();
        assert_eq!(table.get_scalar::<u64>(0, 0).unwrap(), a);
        assert_eq!(table.get_scalar::<i32>(1, 0).unwrap(), b);
        assert_eq!(table.get_scalar::<f64>(2, 0.0).unwrap(), c);
        assert_eq!(table.get_scalar::<bool>(3, false).unwrap(), d);
    }
}

#[test]
fn verify_defaults_read_back_as_declared_not_zero() {
    let mut builder = Builder::new();
    builder.start_table(2);
    // Slot 0 equals its non-zero default: pruned.
    builder.push_slot_scalar::<i16>(0, -7, -7);
    builder.push_slot_scalar::<u32>(1, 1, 0);
    let root = builder.end_table();
    builder.finish(root);

    let table = root_table(builder.finished_data()).unwrap();
    assert_eq!(table.get_scalar::<i16>(0, -7).unwrap(), -7);
}

// ============================================================================
// LAW 2: OMISSION
// ============================================================================

#[test]
fn verify_omitted_fields_shrink_the_buffer() {
    let build = |score: u32| {
        let mut builder = Builder::new();
        builder.start_table(2);
        builder.push_slot_scalar::<u32>(0, 3, 0);
        builder.push_slot_scalar::<u32>(1, score, 0);
        let root = builder.end_table();
        builder.finish(root);
        builder.finished_data().to_vec()
    };

    let omitted = build(0);
    let explicit = build(44);
    assert!(omitted.len() < explicit.len());

    let table = root_table(&omitted).unwrap();
    assert_eq!(table.get_scalar::<u32>(1, 0).unwrap(), 0);
}

// ============================================================================
// LAW 3: COMPATIBILITY
// ============================================================================

#[test]
fn verify_forward_compatibility_old_reader_new_writer() {
    // Writer knows 4 slots.
    let mut builder = Builder::new();
    builder.start_table(4);
    builder.push_slot_scalar::<u32>(0, 10, 0);
    builder.push_slot_scalar::<u32>(1, 20, 0);
    builder.push_slot_scalar::<u32>(2, 30, 0);
    builder.push_slot_scalar::<u32>(3, 40, 0);
    let root = builder.end_table();
    builder.finish(root);

    // Reader only knows the first 3 - values are untouched.
    let table = root_table(builder.finished_data()).unwrap();
    assert_eq!(table.get_scalar::<u32>(0, 0).unwrap(), 10);
    assert_eq!(table.get_scalar::<u32>(1, 0).unwrap(), 20);
    assert_eq!(table.get_scalar::<u32>(2, 0).unwrap(), 30);
}

#[test]
fn verify_backward_compatibility_new_reader_old_writer() {
    // Writer knows 2 slots.
    let mut builder = Builder::new();
    builder.start_table(2);
    builder.push_slot_scalar::<u32>(0, 10, 0);
    builder.push_slot_scalar::<u32>(1, 20, 0);
    let root = builder.end_table();
    builder.finish(root);

    // Reader knows slot 2 as well - it reads the declared default.
    let table = root_table(builder.finished_data()).unwrap();
    assert_eq!(table.get_scalar::<u32>(2, 1234).unwrap(), 1234);
}

// ============================================================================
// LAW 4: BOUNDS
// ============================================================================

#[test]
fn verify_hostile_vtable_length_fails_loudly() {
    let mut builder = Builder::new();
    builder.start_table(1);
    builder.push_slot_scalar::<u32>(0, 5, 0);
    let root = builder.end_table();
    builder.finish(root);
    let buf = builder.finished_data().to_vec();

    let table_pos = root_table(&buf).unwrap().position();
    let back_pointer =
        i32::from_le_bytes([buf[table_pos], buf[table_pos + 1], buf[table_pos + 2], buf[table_pos + 3]]);
    let vtable_pos = (table_pos as i64 - i64::from(back_pointer)) as usize;

    let mut evil = buf.clone();
    evil[vtable_pos..vtable_pos + 2].copy_from_slice(&0x7FFFu16.to_le_bytes());

    let table = root_table(&evil).unwrap();
    assert!(matches!(
        table.get_scalar::<u32>(0, 0).unwrap_err(),
        WireError::MalformedVTable { declared: 0x7FFF, .. }
    ));
}

#[test]
fn verify_hostile_back_pointer_fails_loudly() {
    let mut builder = Builder::new();
    builder.start_table(1);
    builder.push_slot_scalar::<u32>(0, 5, 0);
    let root = builder.end_table();
    builder.finish(root);
    let buf = builder.finished_data().to_vec();

    let table_pos = root_table(&buf).unwrap().position();
    let mut evil = buf.clone();
    evil[table_pos..table_pos + 4].copy_from_slice(&i32::MIN.to_le_bytes());

    let table = root_table(&evil).unwrap();
    assert!(matches!(
        table.get_scalar::<u32>(0, 0).unwrap_err(),
        WireError::DanglingVTable { .. }
    ));
}

// ============================================================================
// LAW 5: FRAMING
// ============================================================================

#[test]
fn verify_framing_splits_byte_identical() {
    let build = |tick: u16| {
        let mut builder = Builder::new();
        builder.start_table(1);
        builder.push_slot_scalar(0, tick, 0);
        let root = builder.end_table();
        builder.finish(root);
        builder.finished_data().to_vec()
    };

    let a = build(60);
    let b = build(128);

    let mut stream = frame(&a);
    frame_into(&b, &mut stream);

    let frames: Vec<_> = read_frames(&stream).map(Result::unwrap).collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], &a[..]);
    assert_eq!(frames[1], &b[..]);

    // Re-framing what came out reproduces the stream exactly.
    let mut rebuilt = frame(frames[0]);
    frame_into(frames[1], &mut rebuilt);
    assert_eq!(rebuilt, stream);
}
