use crate::{Error, FormatError, Reader, Writer};

fn build<F: FnOnce(&mut Writer) -> crate::Result<()>>(f: F) -> Vec<u8> {
    let mut w = Writer::new_buffered();
    f(&mut w).unwrap();
    w.end_pack().unwrap()
}

#[test]
fn scalar_roundtrip() -> crate::Result<()> {
    let bytes = build(|w| {
        w.write_bool(1, true, None)?;
        w.write_u32(2, 77, None)?;
        w.write_i32(3, -1, None)?;
        w.write_i64(4, i64::MIN, None)?;
        w.write_u64(5, u64::MAX, None)?;
        w.write_ptr(6, 0xDEADBEEF, None)?;
        w.write_time(7, 1_700_000_000, None)?;
        Ok(())
    });

    let mut r = Reader::from_bytes(bytes)?;
    assert_eq!(r.read_bool(1, None)?, true);
    assert_eq!(r.read_u32(2, None)?, 77);
    assert_eq!(r.read_i32(3, None)?, -1);
    assert_eq!(r.read_i64(4, None)?, i64::MIN);
    assert_eq!(r.read_u64(5, None)?, u64::MAX);
    assert_eq!(r.read_ptr(6, None)?, 0xDEADBEEF);
    assert_eq!(r.read_time(7, None)?, 1_700_000_000);
    r.end_pack()?;
    Ok(())
}

#[test]
fn empty_and_nonempty_blobs() -> crate::Result<()> {
    let bytes = build(|w| {
        w.write_str(1, "", None)?;
        w.write_str(2, "ab", None)?;
        w.write_bin(3, &[], None)?;
        w.write_bin(4, &[1, 2, 3], None)?;
        Ok(())
    });

    let mut r = Reader::from_bytes(bytes)?;
    assert_eq!(r.read_str(1, None)?, "");
    assert_eq!(r.read_str(2, None)?, "ab");
    assert_eq!(r.read_bin(3, None)?, Vec::<u8>::new());
    assert_eq!(r.read_bin(4, None)?, vec![1, 2, 3]);
    r.end_pack()?;
    Ok(())
}

#[test]
fn nested_object_and_array() -> crate::Result<()> {
    let bytes = build(|w| {
        w.obj_begin(1)?;
        w.write_i32(1, -1, None)?;
        w.obj_end()?;
        w.array_begin(2)?;
        w.write_bool(0, true, None)?;
        w.write_bool(0, false, None)?;
        w.write_bool(0, true, None)?;
        w.array_end()?;
        Ok(())
    });

    let mut r = Reader::from_bytes(bytes)?;
    r.obj_begin(1)?;
    assert_eq!(r.read_i32(1, None)?, -1);
    r.obj_end()?;
    r.array_begin(2)?;
    assert_eq!(r.read_bool(1, None)?, true);
    assert_eq!(r.read_bool(2, None)?, false);
    assert_eq!(r.read_bool(3, None)?, true);
    r.array_end()?;
    r.end_pack()?;
    Ok(())
}

#[test]
fn skips_unknown_fields_between_requested_ids() -> crate::Result<()> {
    let bytes = build(|w| {
        w.write_u32(1, 1, None)?;
        w.write_str(2, "ignored", None)?;
        w.obj_begin(3)?;
        w.write_u32(1, 9, None)?;
        w.obj_end()?;
        w.write_u32(4, 4, None)?;
        Ok(())
    });

    let mut r = Reader::from_bytes(bytes)?;
    assert_eq!(r.read_u32(1, None)?, 1);
    // Skips id 2 (str) and id 3 (a whole nested object) to reach id 4.
    assert_eq!(r.read_u32(4, None)?, 4);
    r.end_pack()?;
    Ok(())
}

#[test]
fn default_elision_round_trips() -> crate::Result<()> {
    let bytes = build(|w| {
        w.write_u32(1, 0, Some(0))?;
        w.write_u32(2, 5, Some(0))?;
        Ok(())
    });
    // Field 1, equal to its default, costs nothing on the wire: field 2's
    // id-delta folds id 1 in, landing back at delta 0.
    assert_eq!(bytes, vec![0xA8, 0x05, 0x00]);

    let mut r = Reader::from_bytes(bytes)?;
    assert_eq!(r.read_u32(1, Some(0))?, 0);
    assert_eq!(r.read_u32(2, Some(0))?, 5);
    r.end_pack()?;
    Ok(())
}

#[test]
fn null_reports_absence_without_consuming() -> crate::Result<()> {
    let bytes = build(|w| {
        w.write_u32(5, 42, None)?;
        Ok(())
    });
    let r = Reader::from_bytes(bytes)?;
    assert!(r.null(1));
    assert!(r.null(4));
    assert!(!r.null(5));
    Ok(())
}

#[test]
fn reading_with_default_for_absent_field() -> crate::Result<()> {
    let bytes = build(|w| {
        w.write_u32(5, 42, None)?;
        Ok(())
    });
    let mut r = Reader::from_bytes(bytes)?;
    assert_eq!(r.read_u32(1, Some(100))?, 100);
    assert_eq!(r.read_u32(5, None)?, 42);
    r.end_pack()?;
    Ok(())
}

#[test]
fn reading_absent_field_without_default_fails() -> crate::Result<()> {
    let bytes = build(|w| {
        w.write_u32(5, 42, None)?;
        Ok(())
    });
    let mut r = Reader::from_bytes(bytes)?;
    match r.read_u32(1, None) {
        Err(Error::Format(FormatError::IdNotFound { id: 1 })) => {}
        other => panic!("expected IdNotFound, got {other:?}"),
    }
    Ok(())
}

#[test]
fn out_of_order_request_is_rejected() -> crate::Result<()> {
    let bytes = build(|w| {
        w.write_u32(1, 1, None)?;
        w.write_u32(2, 2, None)?;
        Ok(())
    });
    let mut r = Reader::from_bytes(bytes)?;
    r.read_u32(2, None)?;
    match r.read_u32(1, None) {
        Err(Error::Format(FormatError::IdAlreadyConsumed { id: 1, id_last: 2 })) => {}
        other => panic!("expected IdAlreadyConsumed, got {other:?}"),
    }
    Ok(())
}

#[test]
fn type_mismatch_is_rejected() -> crate::Result<()> {
    let bytes = build(|w| {
        w.write_u32(1, 1, None)?;
        Ok(())
    });
    let mut r = Reader::from_bytes(bytes)?;
    match r.read_str(1, None) {
        Err(Error::Format(FormatError::TypeMismatch { expected: "str", found: "u32" })) => {}
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn ending_wrong_container_kind_is_rejected() -> crate::Result<()> {
    let bytes = build(|w| {
        w.obj_begin(1)?;
        w.write_u32(1, 1, None)?;
        w.obj_end()?;
        Ok(())
    });
    let mut r = Reader::from_bytes(bytes)?;
    r.obj_begin(1)?;
    match r.array_end() {
        Err(Error::Format(FormatError::WrongContainer { expected: "array", found: "object" })) => {}
        other => panic!("expected WrongContainer, got {other:?}"),
    }
    Ok(())
}

#[test]
fn writer_rejects_non_increasing_ids() {
    let mut w = Writer::new_buffered();
    w.write_u32(3, 3, None).unwrap();
    match w.write_u32(2, 2, None) {
        Err(Error::Assertion(crate::AssertionFailure::NonIncreasingId { id: 2, id_last: 3 })) => {}
        other => panic!("expected NonIncreasingId, got {other:?}"),
    }
}

#[test]
fn writer_rejects_end_pack_with_open_frames() {
    let mut w = Writer::new_buffered();
    w.obj_begin(1).unwrap();
    match w.end_pack() {
        Err(Error::Assertion(crate::AssertionFailure::OpenFrames { depth: 1 })) => {}
        other => panic!("expected OpenFrames, got {other:?}"),
    }
}

#[test]
fn deeply_nested_mixed_structure_roundtrips() -> crate::Result<()> {
    let bytes = build(|w| {
        w.write_str(1, "root", None)?;
        w.obj_begin(2)?;
        w.write_u32(1, 10, None)?;
        w.array_begin(2)?;
        w.write_i32(0, -5, None)?;
        w.obj_begin(0)?;
        w.write_bool(1, true, None)?;
        w.obj_end()?;
        w.array_end()?;
        w.obj_end()?;
        w.write_bool(3, false, None)?;
        Ok(())
    });

    let mut r = Reader::from_bytes(bytes)?;
    assert_eq!(r.read_str(1, None)?, "root");
    r.obj_begin(2)?;
    assert_eq!(r.read_u32(1, None)?, 10);
    r.array_begin(2)?;
    assert_eq!(r.read_i32(1, None)?, -5);
    r.obj_begin(2)?;
    assert_eq!(r.read_bool(1, None)?, true);
    r.obj_end()?;
    r.array_end()?;
    r.obj_end()?;
    assert_eq!(r.read_bool(3, None)?, false);
    r.end_pack()?;
    Ok(())
}
