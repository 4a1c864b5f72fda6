//! Array file save/load tests
//!
//! Covers the on-disk layout of freshly created files and reading them back
//! for every supported element type.

use npy_archive::{load_array, save_array, save_buffer, Dtype, DtypeKind, ErrorKind, SaveMode, TypedBuffer};
use tempfile::TempDir;

#[test]
fn test_2x3_f64_layout() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("a.npy");

    let values = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
    save_array(&path, &values, &[2, 3], SaveMode::Create).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..6], b"\x93NUMPY");
    assert_eq!(&bytes[6..8], &[1, 0]);

    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize + 10;
    assert_eq!(header_len % 16, 0);
    assert_eq!(bytes[header_len - 1], b'\n');

    let dict = std::str::from_utf8(&bytes[10..header_len]).unwrap();
    assert!(dict.starts_with("{'descr': '<f8', 'fortran_order': False, 'shape': (2, 3), }"));

    // Header plus 48 bytes of payload
    assert_eq!(bytes.len(), header_len + 48);
    assert_eq!(&bytes[header_len..header_len + 8], &1.0f64.to_le_bytes());

    let loaded = load_array(&path).unwrap();
    assert_eq!(loaded.shape(), &[2, 3]);
    assert_eq!(loaded.word_size(), 8);
    assert!(!loaded.is_fortran_order());
    assert_eq!(loaded.num_vals(), 6);
    assert_eq!(loaded.num_bytes(), 48);
    assert_eq!(loaded.as_vec::<f64>().unwrap(), values);
}

#[test]
fn test_one_dimensional_shape_has_trailing_comma() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("v.npy");

    save_array(&path, &[10i32, 20, 30, 40, 50], &[5], SaveMode::Create).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let text = String::from_utf8_lossy(&bytes[10..]);
    assert!(text.contains("'shape': (5,)"));
    assert!(text.contains("'descr': '<i4'"));

    let loaded = load_array(&path).unwrap();
    assert_eq!(loaded.shape(), &[5]);
    assert_eq!(loaded.as_vec::<i32>().unwrap(), vec![10, 20, 30, 40, 50]);
}

#[test]
fn test_every_element_type() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    save_array(dir.join("u8.npy"), &[1u8, 255], &[2], SaveMode::Create).unwrap();
    save_array(dir.join("u16.npy"), &[1u16, 65535], &[2], SaveMode::Create).unwrap();
    save_array(dir.join("u32.npy"), &[1u32, u32::MAX], &[2], SaveMode::Create).unwrap();
    save_array(dir.join("u64.npy"), &[1u64, u64::MAX], &[2], SaveMode::Create).unwrap();
    save_array(dir.join("i8.npy"), &[-1i8, 127], &[2], SaveMode::Create).unwrap();
    save_array(dir.join("i16.npy"), &[-1i16, 300], &[2], SaveMode::Create).unwrap();
    save_array(dir.join("i64.npy"), &[i64::MIN, 0], &[2], SaveMode::Create).unwrap();
    save_array(dir.join("f32.npy"), &[0.5f32, -0.25], &[2], SaveMode::Create).unwrap();

    let expect = |file: &str, descr: &str| {
        let loaded = load_array(dir.join(file)).unwrap();
        assert_eq!(loaded.dtype().descr(), descr, "{}", file);
        loaded
    };

    assert_eq!(expect("u8.npy", "|u1").as_vec::<u8>().unwrap(), vec![1, 255]);
    assert_eq!(expect("u16.npy", "<u2").as_vec::<u16>().unwrap(), vec![1, 65535]);
    assert_eq!(expect("u32.npy", "<u4").as_vec::<u32>().unwrap(), vec![1, u32::MAX]);
    assert_eq!(expect("u64.npy", "<u8").as_vec::<u64>().unwrap(), vec![1, u64::MAX]);
    assert_eq!(expect("i8.npy", "|i1").as_vec::<i8>().unwrap(), vec![-1, 127]);
    assert_eq!(expect("i16.npy", "<i2").as_vec::<i16>().unwrap(), vec![-1, 300]);
    assert_eq!(expect("i64.npy", "<i8").as_vec::<i64>().unwrap(), vec![i64::MIN, 0]);
    assert_eq!(expect("f32.npy", "<f4").as_vec::<f32>().unwrap(), vec![0.5, -0.25]);
}

#[cfg(feature = "complex")]
#[test]
fn test_complex_elements() {
    use num_complex::Complex;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("c.npy");
    let values = [Complex::new(1.0f64, -1.0), Complex::new(0.0, 2.5)];
    save_array(&path, &values, &[2], SaveMode::Create).unwrap();

    let loaded = load_array(&path).unwrap();
    assert_eq!(loaded.dtype().descr(), "<c16");
    assert_eq!(loaded.as_vec::<Complex<f64>>().unwrap(), values);
}

#[test]
fn test_zero_dimensional_array() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("s.npy");

    save_array(&path, &[42.0f64], &[], SaveMode::Create).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("'shape': ()"));

    let loaded = load_array(&path).unwrap();
    assert!(loaded.shape().is_empty());
    assert_eq!(loaded.num_vals(), 1);
    assert_eq!(loaded.as_vec::<f64>().unwrap(), vec![42.0]);
}

#[test]
fn test_empty_leading_dimension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("e.npy");

    save_array::<f32, _>(&path, &[], &[0, 4], SaveMode::Create).unwrap();
    let loaded = load_array(&path).unwrap();
    assert_eq!(loaded.shape(), &[0, 4]);
    assert_eq!(loaded.num_bytes(), 0);
}

#[test]
fn test_create_replaces_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("r.npy");

    save_array(&path, &[0u64; 1000], &[1000], SaveMode::Create).unwrap();
    save_array(&path, &[7u8], &[1], SaveMode::Create).unwrap();

    let loaded = load_array(&path).unwrap();
    assert_eq!(loaded.shape(), &[1]);
    assert_eq!(loaded.as_vec::<u8>().unwrap(), vec![7]);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 80 + 1);
}

#[test]
fn test_element_count_must_match_shape() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.npy");

    let err = save_array(&path, &[1.0f64, 2.0, 3.0], &[2, 2], SaveMode::Create).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);
    assert!(!path.exists());
}

#[test]
fn test_save_buffer_keeps_descriptor() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("raw.npy");

    // Bytes tagged as unsigned 2-byte ints
    let dtype = Dtype::new(DtypeKind::UnsignedInt, 2);
    let buffer = TypedBuffer::new(dtype, vec![2], false, vec![1, 0, 2, 0]).unwrap();
    save_buffer(&path, &buffer, SaveMode::Create).unwrap();

    let loaded = load_array(&path).unwrap();
    assert_eq!(loaded, buffer);
    assert_eq!(loaded.as_vec::<u16>().unwrap(), vec![1, 2]);
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = load_array(temp_dir.path().join("nope.npy")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}
