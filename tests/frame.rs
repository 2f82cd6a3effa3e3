// Copyright 2026 Duolu Developers. See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: Duolu Developers

#![deny(rust_2018_idioms)]

#[cfg(test)]
mod tests {
    use bytes::{BufMut, Bytes, BytesMut};
    use tokio_util::codec::{Decoder, Encoder};

    use duolu::{
        http2::{
            frame::{
                get_bit, get_u31_at, set_bit, set_u31_at, Data, Flag, Frame, FrameHeader, GoAway,
                Headers, Kind, Ping, Reset, Settings, WindowUpdate,
            },
            hpack::HeaderField,
            FrameCodec,
        },
        Consts, FramingError, Priority, ProtError, Reason, StreamIdentifier,
    };

    fn codec() -> FrameCodec {
        FrameCodec::new(
            Consts::DEFAULT_MAX_FRAME_SIZE as usize,
            Consts::DEFAULT_HEADER_TABLE_SIZE,
            true,
        )
    }

    fn round_trip(frame: Frame) -> Frame {
        let mut writer = codec();
        let mut reader = codec();
        let mut buf = BytesMut::new();
        writer.encode(frame, &mut buf).unwrap();
        let decoded = reader.decode(&mut buf).unwrap().unwrap();
        assert!(buf.is_empty());
        decoded
    }

    #[test]
    fn bit_packing() {
        let mut byte = 1u8;
        byte = set_bit(byte, true, 3);
        assert_eq!(byte, 9);
        byte = set_bit(byte, false, 3);
        assert_eq!(byte, 1);

        let mut byte = 0u8;
        let mut seen = vec![];
        for (on, index) in [(true, 7), (true, 6), (true, 5), (false, 7), (false, 6), (false, 5)] {
            byte = set_bit(byte, on, index);
            seen.push(byte);
        }
        assert_eq!(seen, vec![128, 192, 224, 96, 32, 0]);
        assert!(!get_bit(byte, 7));
        assert!(get_bit(9, 0) && get_bit(9, 3) && !get_bit(9, 1));
    }

    #[test]
    fn reserved_bit_written_as_zero() {
        let mut buf = [0u8; 4];
        set_u31_at(&mut buf, 0, 0xffff_ffff);
        assert_eq!(buf, [0x7f, 0xff, 0xff, 0xff]);
        assert_eq!(get_u31_at(&[0xff, 0, 0, 1], 0), 1);
    }

    #[test]
    fn flags_do_not_disturb_each_other() {
        let flag = Flag::zero().set_fin(true).set_end_headers(true);
        assert!(flag.is_fin() && flag.is_end_headers() && !flag.has_priority());
        let flag = flag.set_fin(false);
        assert!(!flag.is_fin() && flag.is_end_headers());
        assert_eq!(flag.bits(), 0b100);
    }

    #[test]
    fn preamble_layout() {
        let head = FrameHeader::new(Kind::Data, Flag::fin(), StreamIdentifier::from(3));
        let mut buf = BytesMut::new();
        head.encode(5, &mut buf);
        assert_eq!(&buf[..], &[0, 5, 0, 1, 0, 0, 0, 3]);
        let parsed = FrameHeader::parse(&buf);
        assert_eq!(parsed.length, 5);
        assert_eq!(parsed.kind, Kind::Data);
        assert!(parsed.flag.is_fin());
        assert_eq!(parsed.stream_id, StreamIdentifier::from(3));
    }

    #[test]
    fn control_frames_round_trip() {
        let mut settings = Settings::default();
        settings.set_initial_window_size(Some(1024));
        settings.set_max_frame_size(Some(20000));
        settings.set_flow_control_options(Some(1));
        let frames: Vec<Frame> = vec![
            settings.into(),
            Settings::ack().into(),
            Ping::new(*b"12345678").into(),
            Ping::pong(*b"abcdefgh").into(),
            GoAway::with_debug_data(
                StreamIdentifier::from(7),
                Reason::PROTOCOL_ERROR,
                Bytes::from_static(b"bad frame"),
            )
            .into(),
            WindowUpdate::new(StreamIdentifier::from(1), 4096).into(),
            Reset::new(StreamIdentifier::from(5), Reason::CANCEL).into(),
        ];
        for frame in frames {
            assert_eq!(round_trip(frame.clone()), frame);
        }
    }

    #[test]
    fn data_and_headers_round_trip() {
        let mut data = Data::new(StreamIdentifier::from(1), Bytes::from_static(b"hello"));
        data.set_fin(true);
        assert_eq!(round_trip(data.clone().into()), Frame::Data(data));

        let fields = vec![
            HeaderField::new(":method", "POST"),
            HeaderField::new(":path", "/upload"),
            HeaderField::new("content-type", "text/plain"),
        ];
        let mut headers = Headers::new(StreamIdentifier::from(3), fields.clone());
        headers.set_priority(Priority::new(6));
        headers.set_fin(true);
        match round_trip(headers.into()) {
            Frame::Headers(decoded) => {
                assert!(decoded.is_fin());
                assert_eq!(decoded.priority(), Priority::new(6));
                assert_eq!(decoded.stream_id(), StreamIdentifier::from(3));
                let names: Vec<_> = decoded.fields().iter().map(|f| f.name.clone()).collect();
                let values: Vec<_> = decoded.fields().iter().map(|f| f.value.clone()).collect();
                assert_eq!(names, fields.iter().map(|f| f.name.clone()).collect::<Vec<_>>());
                assert_eq!(values, fields.iter().map(|f| f.value.clone()).collect::<Vec<_>>());
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn oversized_frame_rejected() {
        let mut buf = BytesMut::new();
        FrameHeader::new(Kind::Data, Flag::zero(), StreamIdentifier::from(1)).encode(20000, &mut buf);
        let err = codec().decode(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            ProtError::Framing(FramingError::TooLarge {
                length: 20000,
                max: 16384
            })
        ));
        assert_eq!(err.reason(), Reason::FRAME_SIZE_ERROR);
        assert!(err.is_fatal());
    }

    #[test]
    fn oversized_header_block_keeps_table() {
        let mut writer = FrameCodec::new(
            Consts::DEFAULT_MAX_FRAME_SIZE as usize,
            Consts::DEFAULT_HEADER_TABLE_SIZE,
            false,
        );
        assert_eq!(writer.send_frame_size(), Consts::DEFAULT_MAX_FRAME_SIZE as usize);
        let mut buf = BytesMut::new();
        let small = Headers::new(StreamIdentifier::from(1), vec![HeaderField::new("x-small", "1")]);
        writer.encode(small.into(), &mut buf).unwrap();
        let entries: Vec<_> = writer.encoder().table().entries().cloned().collect();

        let big = Headers::new(
            StreamIdentifier::from(3),
            vec![HeaderField::new("x-big", vec![b'a'; 20000])],
        );
        let mut rejected = BytesMut::new();
        let err = writer.encode(big.clone().into(), &mut rejected).unwrap_err();
        assert!(matches!(
            err,
            ProtError::Reset(id, Reason::FRAME_SIZE_ERROR, _) if id == StreamIdentifier::from(3)
        ));
        assert!(err.is_stream_error());
        assert!(!err.is_fatal());
        assert!(rejected.is_empty());
        assert_eq!(
            writer.encoder().table().entries().cloned().collect::<Vec<_>>(),
            entries
        );

        // 对端允许更大的帧时可以发送
        writer.set_send_frame_size(Consts::MAX_FRAME_SIZE as usize);
        writer.encode(big.into(), &mut buf).unwrap();
        let mut reader = FrameCodec::new(
            Consts::MAX_FRAME_SIZE as usize,
            Consts::DEFAULT_HEADER_TABLE_SIZE,
            false,
        );
        assert_eq!(reader.max_frame_size(), Consts::MAX_FRAME_SIZE as usize);
        assert!(matches!(reader.decode(&mut buf).unwrap(), Some(Frame::Headers(_))));
        match reader.decode(&mut buf).unwrap() {
            Some(Frame::Headers(decoded)) => {
                assert_eq!(decoded.stream_id(), StreamIdentifier::from(3));
                assert_eq!(decoded.fields()[0].value.len(), 20000);
            }
            other => panic!("unexpected frame {:?}", other),
        }
        assert_eq!(
            reader.decoder().table().entries().cloned().collect::<Vec<_>>(),
            writer.encoder().table().entries().cloned().collect::<Vec<_>>()
        );
    }

    #[test]
    fn end_flow_control_window_update() {
        let update = WindowUpdate::end_flow_control(StreamIdentifier::from(5));
        let frame: Frame = update.into();
        assert!(frame.is_stream_frame());
        assert!(!Frame::from(WindowUpdate::end_flow_control(StreamIdentifier::zero())).is_stream_frame());
        assert!(!Frame::from(WindowUpdate::new(StreamIdentifier::from(5), 10)).is_stream_frame());
        match round_trip(frame) {
            Frame::WindowUpdate(decoded) => {
                assert!(decoded.is_end_flow_control());
                assert_eq!(decoded.increment(), 0);
                assert_eq!(decoded.stream_id(), StreamIdentifier::from(5));
            }
            other => panic!("unexpected frame {:?}", other),
        }
        let plain = round_trip(WindowUpdate::new(StreamIdentifier::from(5), 10).into());
        assert!(matches!(plain, Frame::WindowUpdate(v) if !v.is_end_flow_control()));
    }

    #[test]
    fn partial_frame_waits_then_truncation_on_eof() {
        let mut codec = codec();
        let mut buf = BytesMut::new();
        FrameHeader::new(Kind::Data, Flag::zero(), StreamIdentifier::from(1)).encode(10, &mut buf);
        buf.put_slice(b"abcd");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(ProtError::Framing(FramingError::Truncated { expected: 10, read: 4 }))
        ));

        let mut codec = self::codec();
        let mut buf = BytesMut::from(&[0u8, 4, 0][..]);
        assert!(matches!(
            codec.decode_eof(&mut buf),
            Err(ProtError::Framing(FramingError::Truncated { .. }))
        ));
    }

    #[test]
    fn clean_eof_on_frame_boundary() {
        let mut codec = codec();
        let mut buf = BytesMut::new();
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());

        let mut writer = self::codec();
        writer
            .encode(Ping::new([0; 8]).into(), &mut buf)
            .unwrap();
        assert!(matches!(codec.decode_eof(&mut buf), Ok(Some(Frame::Ping(_)))));
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn malformed_payloads() {
        let mut buf = BytesMut::new();
        FrameHeader::new(Kind::Ping, Flag::zero(), StreamIdentifier::zero()).encode(4, &mut buf);
        buf.put_slice(&[0; 4]);
        assert!(matches!(
            codec().decode(&mut buf),
            Err(ProtError::Framing(FramingError::Malformed(_)))
        ));

        let mut buf = BytesMut::new();
        FrameHeader::new(Kind::Data, Flag::zero(), StreamIdentifier::zero()).encode(1, &mut buf);
        buf.put_u8(1);
        assert!(matches!(
            codec().decode(&mut buf),
            Err(ProtError::Framing(FramingError::InvalidStreamId(_)))
        ));

        let mut buf = BytesMut::new();
        FrameHeader::new(Kind::Settings, Flag::zero(), StreamIdentifier::zero()).encode(5, &mut buf);
        buf.put_slice(&[0; 5]);
        assert!(codec().decode(&mut buf).is_err());
    }

    #[test]
    fn unknown_kind_kept_as_header() {
        let mut buf = BytesMut::new();
        FrameHeader::new(Kind::Unknown(0x20), Flag::zero(), StreamIdentifier::from(1))
            .encode(2, &mut buf);
        buf.put_slice(&[1, 2]);
        match codec().decode(&mut buf).unwrap() {
            Some(Frame::Unknown(head)) => assert_eq!(head.kind, Kind::Unknown(0x20)),
            other => panic!("unexpected frame {:?}", other),
        }
        assert!(buf.is_empty());
    }
}
