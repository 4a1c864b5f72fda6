//! Cross-module tests
//!
//! Exercises the interaction between:
//! - Array files and the append path
//! - Archives holding arrays of several element types
//! - Codec configuration and checksum verification

#[cfg(test)]
mod tests {
    use crate::core::archive::{list_members, EndOfCentralDirectory};
    use crate::core::buffer::TypedBuffer;
    use crate::core::config::{CodecConfig, SaveMode};
    use crate::core::dtype::{Dtype, DtypeKind};
    use crate::core::error::{ErrorKind, NpyError};
    use crate::core::header::ArrayHeader;
    use crate::{Codec, CodecBuilder};
    use tempfile::TempDir;

    #[test]
    fn test_array_file_then_archive_member() {
        let temp_dir = TempDir::new().unwrap();
        let npy = temp_dir.path().join("grid.npy");
        let npz = temp_dir.path().join("bundle.npz");
        let codec = Codec::default();

        let values: Vec<i16> = (0..12).collect();
        codec.save_array(&npy, &values, &[3, 4], SaveMode::Create).unwrap();

        // Move the loaded array into an archive unchanged
        let loaded = codec.load_array(&npy).unwrap();
        codec
            .save_archive_buffer(&npz, "grid", &loaded, SaveMode::Create)
            .unwrap();

        let member = codec.load_archive_member(&npz, "grid").unwrap();
        assert_eq!(member, loaded);
        assert_eq!(member.dtype(), Dtype::new(DtypeKind::SignedInt, 2));
        assert_eq!(member.as_vec::<i16>().unwrap(), values);

        // Archive member bytes are exactly the array file bytes
        let file_bytes = std::fs::read(&npy).unwrap();
        let listed = list_members(&npz).unwrap();
        assert_eq!(listed[0].uncompressed_size as usize, file_bytes.len());
        assert_eq!(listed[0].crc32, crc32fast::hash(&file_bytes));
    }

    #[test]
    fn test_mixed_element_types_in_one_archive() {
        let temp_dir = TempDir::new().unwrap();
        let npz = temp_dir.path().join("mixed.npz");
        let codec = Codec::default();

        codec
            .save_archive_member(&npz, "flags", &[true, false, true], &[3], SaveMode::Create)
            .unwrap();
        codec
            .save_archive_member(&npz, "bytes", &[7u8, 8, 9, 10], &[2, 2], SaveMode::Append)
            .unwrap();
        codec
            .save_archive_member(&npz, "scalar", &[2.5f32], &[], SaveMode::Append)
            .unwrap();

        let archive = codec.load_archive(&npz).unwrap();
        assert_eq!(archive.len(), 3);
        assert_eq!(archive["flags"].dtype().descr(), "|b1");
        assert_eq!(archive["flags"].as_vec::<bool>().unwrap(), vec![true, false, true]);
        assert_eq!(archive["bytes"].dtype().descr(), "|u1");
        assert_eq!(archive["bytes"].shape(), &[2, 2]);
        assert_eq!(archive["scalar"].shape(), &[] as &[usize]);
        assert_eq!(archive["scalar"].as_vec::<f32>().unwrap(), vec![2.5]);
    }

    #[test]
    fn test_appended_array_survives_archiving() {
        let temp_dir = TempDir::new().unwrap();
        let npy = temp_dir.path().join("grow.npy");
        let npz = temp_dir.path().join("grow.npz");
        let codec = Codec::default();

        for chunk in 0..4u32 {
            let rows = [chunk * 2, chunk * 2 + 1];
            codec.save_array(&npy, &rows, &[1, 2], SaveMode::Append).unwrap();
        }

        let grown = codec.load_array(&npy).unwrap();
        assert_eq!(grown.shape(), &[4, 2]);

        codec
            .save_archive_buffer(&npz, "grown", &grown, SaveMode::Create)
            .unwrap();
        let member = codec.load_archive_member(&npz, "grown").unwrap();
        assert_eq!(member.as_vec::<u32>().unwrap(), (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_checksum_toggle_through_builder() {
        let temp_dir = TempDir::new().unwrap();
        let npz = temp_dir.path().join("crc.npz");
        Codec::default()
            .save_archive_member(&npz, "x", &[1.0f64, 2.0], &[2], SaveMode::Create)
            .unwrap();

        // Flip a payload byte; the header dictionary stays intact
        let mut bytes = std::fs::read(&npz).unwrap();
        let trailer = EndOfCentralDirectory::from_bytes(&bytes[bytes.len() - 22..]).unwrap();
        let last_payload_byte = trailer.directory_offset as usize - 1;
        bytes[last_payload_byte] ^= 0x01;
        std::fs::write(&npz, &bytes).unwrap();

        let strict = CodecBuilder::new().build();
        let err = strict.load_archive(&npz).unwrap_err();
        assert!(matches!(err, NpyError::ChecksumMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::Format);

        let lenient = CodecBuilder::new().verify_checksums(false).build();
        let loaded = lenient.load_archive_member(&npz, "x").unwrap();
        assert_eq!(loaded.as_vec::<f64>().unwrap()[0], 1.0);
    }

    #[test]
    fn test_config_from_json_drives_codec() {
        let config = CodecConfig::from_json(r#"{"sync_on_write": true}"#).unwrap();
        let codec = CodecBuilder::new().config(config).build();
        assert!(codec.config().sync_on_write);
        assert!(codec.config().verify_checksums);

        let temp_dir = TempDir::new().unwrap();
        let npy = temp_dir.path().join("synced.npy");
        codec.save_array(&npy, &[1i64, 2, 3], &[3], SaveMode::Create).unwrap();
        assert_eq!(codec.load_array(&npy).unwrap().num_vals(), 3);
    }

    #[test]
    fn test_fortran_buffer_is_not_saved() {
        let temp_dir = TempDir::new().unwrap();
        let npy = temp_dir.path().join("f.npy");

        let buffer =
            TypedBuffer::new(Dtype::of::<u8>(), vec![2, 2], true, vec![1, 2, 3, 4]).unwrap();
        let err = Codec::default()
            .save_buffer(&npy, &buffer, SaveMode::Create)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
        assert!(!npy.exists());
    }

    #[test]
    fn test_fortran_file_loads_with_flag() {
        let temp_dir = TempDir::new().unwrap();
        let npy = temp_dir.path().join("f.npy");

        let mut header = ArrayHeader::new(Dtype::of::<u8>(), vec![2, 3]);
        header.fortran_order = true;
        let mut bytes = header.to_bytes().unwrap();
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        std::fs::write(&npy, &bytes).unwrap();

        let loaded = Codec::default().load_array(&npy).unwrap();
        assert!(loaded.is_fortran_order());
        assert_eq!(loaded.shape(), &[2, 3]);
    }
}
