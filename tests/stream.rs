mod common;

use common::*;
use negoex::negoex::fields;
use negoex::{
    decode_stream, DecoderConfig, DiagnosticKind, Error, ErrorKind, FieldEvent, FieldValue, MessageBody,
    MessageType, NegoexDecoder, RecordingSink, RecoveryMode, Termination,
};

#[test]
fn short_buffer_is_a_clean_end() {
    init_tracing();

    let buf = alert(0, 0, &[]);
    let mut sink = RecordingSink::new();

    let summary = decode_stream(&buf[..39], &mut sink);

    assert!(summary.messages.is_empty());
    assert_eq!(summary.termination, Termination::ShortTail { remaining: 39 });
    assert!(summary.termination.is_clean());
    assert!(sink.events().is_empty());
}

#[test]
fn empty_buffer() {
    let summary = decode_stream(&[], &mut RecordingSink::new());

    assert!(summary.messages.is_empty());
    assert_eq!(summary.termination, Termination::EndOfBuffer);
}

#[test]
fn three_nego_messages_back_to_back() {
    init_tracing();

    let first = nego(MessageType::InitiatorNego, 0, &[KERBEROS_SCHEME, PKU2U_SCHEME], &[]);
    let second = nego(MessageType::AcceptorNego, 1, &[PKU2U_SCHEME], &[b"ext".as_slice()]);
    let third = nego(MessageType::InitiatorNego, 2, &[], &[]);
    let buf = [first.as_slice(), second.as_slice(), third.as_slice()].concat();
    let mut sink = RecordingSink::new();

    let summary = decode_stream(&buf, &mut sink);

    assert_eq!(summary.termination, Termination::EndOfBuffer);
    assert_eq!(summary.end_offset, buf.len());
    assert_eq!(
        summary.messages.iter().map(|message| message.offset).collect::<Vec<_>>(),
        [0, first.len(), first.len() + second.len()]
    );
    assert_eq!(summary.info(), "INITIATOR_NEGO, ACCEPTOR_NEGO, INITIATOR_NEGO");

    let Some(MessageBody::Nego(body)) = &summary.messages[1].body else {
        panic!("expected a Nego body");
    };
    assert_eq!(body.auth_schemes, [PKU2U_SCHEME]);
    assert_eq!(body.extensions[0].value, b"ext");

    assert_eq!(
        sink.values(fields::SEQUENCE_NUM).cloned().collect::<Vec<_>>(),
        [FieldValue::U32(0), FieldValue::U32(1), FieldValue::U32(2)]
    );
    assert!(sink.diagnostics().is_empty());
    assert!(sink.is_balanced());
}

#[test]
fn field_ranges_are_absolute() {
    let first = alert(0, 0, &[]);
    let second = nego(MessageType::AcceptorNego, 1, &[KERBEROS_SCHEME], &[]);
    let buf = [first.as_slice(), second.as_slice()].concat();
    let mut sink = RecordingSink::new();

    decode_stream(&buf, &mut sink);

    let auth_scheme_ranges: Vec<_> = sink.scalars(fields::AUTH_SCHEME).map(|(_, range)| range.offset).collect();
    // alert auth scheme, then the GUID referenced by the second message
    assert_eq!(auth_scheme_ranges, [40, first.len() + 96]);
}

#[test]
fn unknown_message_type_is_skipped() {
    init_tracing();

    let unknown = raw(99, 0, &[1, 2, 3, 4, 5, 6, 7, 8]);
    let valid = alert(1, 0xc000_0022, &[]);
    let buf = [unknown.as_slice(), valid.as_slice()].concat();
    let mut sink = RecordingSink::new();

    let summary = decode_stream(&buf, &mut sink);

    assert_eq!(summary.termination, Termination::EndOfBuffer);
    assert_eq!(summary.messages.len(), 2);

    let unknown = &summary.messages[0];
    assert_eq!(unknown.header.message_type, 99);
    assert_eq!(unknown.message_type(), None);
    assert_eq!(unknown.body, Some(MessageBody::Unknown(&[1, 2, 3, 4, 5, 6, 7, 8])));

    assert_eq!(summary.messages[1].message_type(), Some(MessageType::Alert));
    assert_eq!(
        sink.value(fields::ERROR_CODE),
        Some(&FieldValue::U32(0xc000_0022))
    );

    let labels = sink.labels();
    assert_eq!(labels[0], "Unknown NEGOEX message type");
    assert!(labels.contains(&"NEGOEX ALERT"));

    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].0.kind, DiagnosticKind::UnknownMessageType);
}

#[test]
fn declared_length_past_the_capture_swallows_the_rest() {
    let mut first = alert(0, 0, &[]);
    first[20..24].copy_from_slice(&200u32.to_le_bytes());
    let second = alert(1, 0xc000_0022, &[]);
    let buf = [first.as_slice(), second.as_slice()].concat();
    let mut sink = RecordingSink::new();

    let summary = decode_stream(&buf, &mut sink);

    // the view runs to the end of the capture, so the second message is alert data
    assert_eq!(summary.messages.len(), 1);
    assert_eq!(summary.termination, Termination::EndOfBuffer);
    assert_eq!(summary.end_offset, buf.len());

    let Some(MessageBody::Alert(body)) = &summary.messages[0].body else {
        panic!("expected an Alert body");
    };
    assert_eq!(body.error_code, 0);
    assert_eq!(body.data, second.as_slice());

    assert_eq!(sink.value(fields::MESSAGE_LEN), Some(&FieldValue::U32(200)));
    assert_eq!(sink.labels(), ["NEGOEX ALERT", "Header"]);
    assert!(sink.diagnostics().is_empty());
}

#[test]
fn unknown_type_past_the_buffer_stops() {
    let mut unknown = raw(42, 0, &[0; 8]);
    unknown[20..24].copy_from_slice(&500u32.to_le_bytes());

    let summary = decode_stream(&unknown, &mut RecordingSink::new());

    assert_eq!(summary.messages.len(), 1);
    assert_eq!(summary.error().map(Error::kind), Some(ErrorKind::FramingError));
}

#[test]
fn zero_message_length_is_fatal() {
    init_tracing();

    let first = alert(0, 0, &[]);
    let mut broken = alert(1, 0, &[]);
    broken[20..24].copy_from_slice(&0u32.to_le_bytes());
    let third = alert(2, 0, &[]);
    let buf = [first.as_slice(), broken.as_slice(), third.as_slice()].concat();

    for recovery in [RecoveryMode::StopOnError, RecoveryMode::Resynchronize] {
        let mut sink = RecordingSink::new();
        let decoder = NegoexDecoder::new(DecoderConfig::with_recovery(recovery));

        let summary = decoder.decode(&buf, &mut sink);

        assert!(matches!(
            summary.termination,
            Termination::Aborted(Error::Framing { message_length: 0, .. })
        ));
        assert_eq!(summary.messages.len(), 2);
        assert!(summary.messages[1].is_malformed());
        assert_eq!(summary.end_offset, first.len());
        // the third message is never emitted
        assert_eq!(sink.values(fields::SEQUENCE_NUM).count(), 2);
        assert!(sink.is_balanced());
    }
}

#[test]
fn out_of_range_vector_is_scoped() {
    init_tracing();

    let mut broken = nego(MessageType::InitiatorNego, 0, &[KERBEROS_SCHEME], &[]);
    // auth scheme count
    broken[84..86].copy_from_slice(&50u16.to_le_bytes());
    let next = alert(1, 0, &[]);
    let buf = [broken.as_slice(), next.as_slice()].concat();
    let mut sink = RecordingSink::new();

    let summary = decode_stream(&buf, &mut sink);

    assert!(matches!(
        summary.termination,
        Termination::Aborted(Error::VectorOutOfRange { count: 50, .. })
    ));
    assert_eq!(summary.messages.len(), 1);
    assert!(summary.messages[0].body.is_none());

    // siblings emitted before and after the vector are intact
    assert_eq!(sink.value(fields::RANDOM), Some(&FieldValue::Bytes(vec![0x5a; 32].into())));
    assert_eq!(sink.value(fields::AUTH_SCHEME_VECTOR_COUNT), Some(&FieldValue::U16(50)));
    assert_eq!(sink.value(fields::EXTENSION_VECTOR_COUNT), Some(&FieldValue::U16(0)));

    let diagnostics = sink.diagnostics();
    assert_eq!(
        diagnostics.iter().map(|(diagnostic, _)| diagnostic.kind).collect::<Vec<_>>(),
        [
            DiagnosticKind::FieldError(ErrorKind::OutOfBounds),
            DiagnosticKind::MalformedMessage(ErrorKind::OutOfBounds),
        ]
    );
    // the field error covers the descriptor only
    assert_eq!(diagnostics[0].1.offset, 80);
    assert_eq!(diagnostics[0].1.len, 8);
    assert!(sink.is_balanced());
}

#[test]
fn malformed_message_marker_is_inside_its_subtree() {
    let mut broken = exchange(MessageType::Challenge, 0, &[0xaa; 4]);
    broken[60..62].copy_from_slice(&400u16.to_le_bytes());
    let mut sink = RecordingSink::new();

    decode_stream(&broken, &mut sink);

    let events = sink.events();
    let marker = events
        .iter()
        .position(|event| {
            matches!(
                event,
                FieldEvent::Diagnostic { diagnostic, .. } if matches!(diagnostic.kind, DiagnosticKind::MalformedMessage(_))
            )
        })
        .unwrap();

    assert!(matches!(events.first(), Some(FieldEvent::BeginSubtree { label, .. }) if label == "NEGOEX CHALLENGE"));
    assert!(matches!(events.last(), Some(FieldEvent::EndSubtree { .. })));
    assert_eq!(marker, events.len() - 2);
}

#[test]
fn resynchronizes_at_the_next_signature() {
    init_tracing();

    let mut broken = nego(MessageType::InitiatorNego, 0, &[KERBEROS_SCHEME], &[]);
    broken[84..86].copy_from_slice(&50u16.to_le_bytes());
    // corrupt length: points into the middle of nowhere
    broken[20..24].copy_from_slice(&1000u32.to_le_bytes());
    let garbage = [0x13; 7];
    let next = verify(1, &[0xcc; 16]);
    let buf = [broken.as_slice(), garbage.as_slice(), next.as_slice()].concat();
    let resumed_at = broken.len() + garbage.len();

    let mut sink = RecordingSink::new();
    let decoder = NegoexDecoder::new(DecoderConfig::with_recovery(RecoveryMode::Resynchronize));

    let summary = decoder.decode(&buf, &mut sink);

    assert_eq!(summary.termination, Termination::EndOfBuffer);
    assert_eq!(summary.messages.len(), 2);
    assert!(summary.messages[0].is_malformed());
    assert_eq!(summary.messages[1].offset, resumed_at);
    assert!(matches!(summary.messages[1].body, Some(MessageBody::Verify(_))));

    let resync = sink
        .diagnostics()
        .into_iter()
        .find(|(diagnostic, _)| diagnostic.kind == DiagnosticKind::Resynchronized)
        .map(|(_, range)| range);
    assert_eq!(resync.map(|range| range.end()), Some(resumed_at));
    assert!(has_signature(&buf[resumed_at..]));

    // the default mode stops at the broken message
    let summary = decode_stream(&buf, &mut RecordingSink::new());
    assert_eq!(summary.messages.len(), 1);
    assert!(!summary.termination.is_clean());
}

#[test]
fn resynchronization_without_signature_stops() {
    let mut broken = nego(MessageType::InitiatorNego, 0, &[KERBEROS_SCHEME], &[]);
    broken[84..86].copy_from_slice(&50u16.to_le_bytes());
    let decoder = NegoexDecoder::new(DecoderConfig::with_recovery(RecoveryMode::Resynchronize));

    let summary = decoder.decode(&broken, &mut RecordingSink::new());

    assert_eq!(summary.messages.len(), 1);
    assert_eq!(summary.error().map(Error::kind), Some(ErrorKind::OutOfBounds));
}

#[test]
fn message_shorter_than_its_header_is_fatal() {
    let mut buf = alert(0, 0, &[]);
    buf[20..24].copy_from_slice(&24u32.to_le_bytes());

    let summary = decode_stream(&buf, &mut RecordingSink::new());

    assert!(matches!(
        summary.termination,
        Termination::Aborted(Error::Framing { message_length: 24, .. })
    ));
}

#[test]
fn decoding_does_not_touch_the_buffer() {
    let buf = [
        nego(MessageType::InitiatorNego, 0, &[KERBEROS_SCHEME], &[b"x".as_slice()]),
        exchange(MessageType::InitiatorMetaData, 1, &[0x30, 0x00]),
        verify(2, &[0; 12]),
    ]
    .concat();
    let before = buf.clone();

    let first = decode_stream(&buf, &mut RecordingSink::new());
    let second = decode_stream(&buf, &mut RecordingSink::new());

    assert_eq!(first, second);
    assert_eq!(before, buf);
}

#[test]
fn decoder_is_shared_across_threads() {
    let decoder = NegoexDecoder::default();
    let buf = [alert(0, 1, &[]), alert(1, 2, &[])].concat();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let summary = decoder.decode(&buf, &mut RecordingSink::new());
                assert_eq!(summary.messages.len(), 2);
            });
        }
    });
}
