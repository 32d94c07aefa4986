//! End-to-end runs through the software reference workstreams.

use framepump::{
    BitstreamFormat, DecodeConfig, DecodePump, EncodeConfig, EncodePump, NullFrameSink,
    RawFrameReader, RawWriterSink, Resolution, SoftwareDecoder, SoftwareEncoder,
};
use framepump_core::RawFormat;
use std::io::Cursor;

/// Raw stream of `frames` QCIF NV12 frames with a per-frame fill pattern.
fn qcif_stream(frames: usize) -> Vec<u8> {
    let frame_size = RawFormat::Nv12.frame_size(176, 144);
    let mut bytes = Vec::with_capacity(frames * frame_size);
    for i in 0..frames {
        bytes.extend(std::iter::repeat(i as u8).take(frame_size));
    }
    bytes
}

fn qcif_decode_config() -> DecodeConfig {
    DecodeConfig::new(BitstreamFormat::H264).with_output(Resolution::new(176, 144))
}

fn decode_counting_frames(input: &[u8], chunk_size: usize) -> u64 {
    let config = qcif_decode_config();
    let mut engine = SoftwareDecoder::new(&config).unwrap();
    let report = DecodePump::new()
        .with_chunk_size(chunk_size)
        .run(&mut engine, &mut Cursor::new(input), &mut NullFrameSink)
        .unwrap();
    assert_eq!(engine.pool().outstanding(), 0, "leaked surfaces");
    report.frames
}

#[test]
fn chunking_invariance() {
    let input = qcif_stream(8);
    for chunk_size in [1, 37, 4096, 38_016, 1 << 20] {
        assert_eq!(
            decode_counting_frames(&input, chunk_size),
            8,
            "frame count changed at chunk size {chunk_size}"
        );
    }
}

#[test]
fn trailing_partial_frame_is_discarded() {
    let mut input = qcif_stream(4);
    input.extend_from_slice(&[0u8; 100]);
    assert_eq!(decode_counting_frames(&input, 4096), 4);
}

#[test]
fn zero_bytes_decode_cleanly() {
    let config = qcif_decode_config();
    let mut engine = SoftwareDecoder::new(&config).unwrap();
    let report = DecodePump::new()
        .run(&mut engine, &mut std::io::empty(), &mut NullFrameSink)
        .unwrap();

    assert_eq!(report.frames, 0);
    assert!(report.fps().is_none());
}

#[test]
fn decoded_planes_reach_the_sink_in_order() {
    let input = qcif_stream(3);
    let config = qcif_decode_config();
    let frame_size = config.output_info().frame_size();
    let mut engine = SoftwareDecoder::new(&config).unwrap();
    let mut sink = RawWriterSink::new(Vec::new());

    let report = DecodePump::new()
        .run(&mut engine, &mut Cursor::new(input), &mut sink)
        .unwrap();

    assert_eq!(report.frames, 3);
    let written = sink.into_inner();
    assert_eq!(written.len(), 3 * frame_size);
    for (i, frame) in written.chunks(frame_size).enumerate() {
        assert!(frame.iter().all(|&b| b == i as u8), "frame {i} corrupted");
    }
}

#[test]
fn encode_ten_cif_frames_reports_exact_ratio() {
    let config = EncodeConfig::new(BitstreamFormat::H264, Resolution::new(352, 288));
    let frame_size = config.source_info().frame_size();
    assert_eq!(frame_size, 352 * 288 * 3 / 2);

    let raw: Vec<u8> = (0..10u8)
        .flat_map(|i| std::iter::repeat(i).take(frame_size))
        .collect();

    let mut engine = SoftwareEncoder::new(&config).unwrap();
    let mut source = RawFrameReader::new(Cursor::new(raw), config.source_info());
    let pool = source.pool().clone();
    let mut dest = Vec::new();

    let report = EncodePump::new()
        .run(&mut engine, &mut source, &mut dest)
        .unwrap();

    assert_eq!(report.frames, 10);
    assert!(!dest.is_empty());
    assert_eq!(report.bytes_written, dest.len() as u64);

    let expected = dest.len() as f64 / (10.0 * frame_size as f64);
    assert!((report.compression_ratio().unwrap() - expected).abs() < 1e-12);

    // The engine released the references acquired for it; the source pool
    // reclaims its creation references.
    source.reclaim();
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn zero_frames_encode_cleanly() {
    let config = EncodeConfig::new(BitstreamFormat::H264, Resolution::new(352, 288));
    let mut engine = SoftwareEncoder::new(&config).unwrap();
    let mut source = RawFrameReader::new(Cursor::new(Vec::new()), config.source_info());
    let mut dest = Vec::new();

    let report = EncodePump::new()
        .run(&mut engine, &mut source, &mut dest)
        .unwrap();

    assert_eq!(report.frames, 0);
    assert_eq!(report.bytes_written, 0);
    assert!(dest.is_empty());
    assert!(report.fps().is_none());
    assert!(report.compression_ratio().is_none());
}

#[test]
fn encode_from_a_file_source() {
    use std::io::Write;

    let config = EncodeConfig::new(BitstreamFormat::H264, Resolution::new(64, 48));
    let frame_size = config.source_info().frame_size();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&vec![0x42u8; frame_size * 5]).unwrap();
    file.flush().unwrap();

    let reader = std::fs::File::open(file.path()).unwrap();
    let mut engine = SoftwareEncoder::new(&config).unwrap();
    let mut source = RawFrameReader::new(reader, config.source_info());
    let mut dest = Vec::new();

    let report = EncodePump::new()
        .run(&mut engine, &mut source, &mut dest)
        .unwrap();

    assert_eq!(report.frames, 5);
    assert!(report.bytes_written > 0);
}

#[test]
fn progress_callback_sees_every_frame() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let input = qcif_stream(4);
    let config = qcif_decode_config();
    let mut engine = SoftwareDecoder::new(&config).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_in_cb = Rc::clone(&seen);
    let report = DecodePump::new()
        .on_progress(move |frame| seen_in_cb.borrow_mut().push(frame))
        .run(&mut engine, &mut Cursor::new(input), &mut NullFrameSink)
        .unwrap();

    assert_eq!(report.frames, 4);
    assert_eq!(*seen.borrow(), vec![1, 2, 3, 4]);
}
