//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Integration tests for atmodem-codec
//!
//! These tests run recorded device transcripts through the line codec and the
//! reply parser together.

use atmodem_codec::charset::{gsm, ucs2};
use atmodem_codec::{
    Command, DATA_PROMPT, LineCodec, Message, Packet, StorageAreas, Value, is_final_status,
    parse_packet,
};
use bytes::BytesMut;
use futures::StreamExt;
use proptest::prelude::*;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{Decoder, FramedRead};

// ============================================================================
// Helper Functions
// ============================================================================

fn decode_all(codec: &mut LineCodec, input: &[u8]) -> Vec<String> {
    let mut buffer = BytesMut::from(input);
    let mut lines = Vec::new();
    while let Some(line) = codec.decode_eof(&mut buffer).unwrap() {
        lines.push(line);
    }
    lines
}

fn decode_chunked(input: &[u8], chunk: usize) -> Vec<String> {
    let mut codec = LineCodec::new();
    let mut buffer = BytesMut::new();
    let mut lines = Vec::new();
    for piece in input.chunks(chunk.max(1)) {
        buffer.extend_from_slice(piece);
        while let Some(line) = codec.decode(&mut buffer).unwrap() {
            lines.push(line);
        }
    }
    while let Some(line) = codec.decode_eof(&mut buffer).unwrap() {
        lines.push(line);
    }
    lines
}

/// Groups a reply transcript the way the engine does: header lines open an
/// entry, other lines extend its body, and a terminal status closes it.
fn bound_reply(prefix: &str, lines: &[String]) -> Vec<Packet> {
    let mut packets = Vec::new();
    let mut header: Option<String> = None;
    let mut body: Vec<String> = Vec::new();
    for line in lines {
        if line.starts_with(prefix) {
            if let Some(pending) = header.take() {
                packets.extend(parse_packet("", &pending, &body.join("\n")).unwrap());
            }
            body.clear();
            header = Some(line.clone());
        } else if is_final_status(line) {
            let pending = header.take().unwrap_or_default();
            packets.extend(parse_packet(line, &pending, &body.join("\n")).unwrap());
            body.clear();
        } else if header.is_some() {
            body.push(line.clone());
        }
    }
    packets
}

const LISTING: &[u8] = b"AT+CMGL=\"ALL\"\r\r\n\
+CMGL: 1,\"REC READ\",\"+15551234\",,\"21/03/15,10:20:30+32\"\r\n\
Hello\r\n\
+CMGL: 2,\"REC UNREAD\",\"+15559876\",,\"21/03/16,08:00:00+32\"\r\n\
Line one\r\n\
Line two\r\n\
\r\n\
OK\r\n";

// ============================================================================
// Transcript Tests
// ============================================================================

#[test]
fn listing_transcript_lines() {
    let mut codec = LineCodec::new();
    let lines = decode_all(&mut codec, LISTING);
    assert_eq!(
        lines,
        vec![
            "AT+CMGL=\"ALL\"",
            "+CMGL: 1,\"REC READ\",\"+15551234\",,\"21/03/15,10:20:30+32\"",
            "Hello",
            "+CMGL: 2,\"REC UNREAD\",\"+15559876\",,\"21/03/16,08:00:00+32\"",
            "Line one",
            "Line two",
            "OK",
        ]
    );
}

#[test]
fn listing_transcript_packets() {
    let mut codec = LineCodec::new();
    let lines = decode_all(&mut codec, LISTING);
    let packets = bound_reply("+CMGL", &lines[1..]);
    assert_eq!(packets.len(), 2);

    match &packets[0] {
        Packet::Message(Message {
            index, body, last, ..
        }) => {
            assert_eq!(*index, Some(1));
            assert_eq!(body, "Hello");
            assert!(!last);
        }
        other => panic!("Expected Message, got {:?}", other),
    }
    match &packets[1] {
        Packet::Message(Message {
            index,
            telephone,
            body,
            last,
            ..
        }) => {
            assert_eq!(*index, Some(2));
            assert_eq!(telephone, "+15559876");
            assert_eq!(body, "Line one\nLine two");
            assert!(last);
        }
        other => panic!("Expected Message, got {:?}", other),
    }
}

#[test]
fn error_transcript() {
    let mut codec = LineCodec::new();
    let lines = decode_all(&mut codec, b"AT+CMGR=9\r\r\n+CMS ERROR: 321\r\n");
    let packets = bound_reply("+CMGR", &lines[1..]);
    assert_eq!(packets, vec![Packet::Error]);
}

#[test]
fn send_transcript_yields_prompt() {
    let mut codec = LineCodec::new();
    let mut buffer = BytesMut::from(&b"AT+CMGS=\"+15551234\"\r\r\n> "[..]);
    assert_eq!(
        codec.decode(&mut buffer).unwrap(),
        Some("AT+CMGS=\"+15551234\"".to_string())
    );
    assert_eq!(
        codec.decode(&mut buffer).unwrap(),
        Some(DATA_PROMPT.to_string())
    );

    buffer.extend_from_slice(b"Hi there\x1A\r\n+CMGS: 17\r\n\r\nOK\r\n");
    let mut lines = Vec::new();
    while let Some(line) = codec.decode(&mut buffer).unwrap() {
        lines.push(line);
    }
    assert_eq!(lines, vec!["Hi there\u{1A}", "+CMGS: 17", "OK"]);
}

#[test]
fn storage_query_round() {
    let line = Command::query("+CPMS").to_line().unwrap();
    assert_eq!(line, "AT+CPMS=?\r\n");

    let mut codec = LineCodec::new();
    let lines = decode_all(
        &mut codec,
        b"\r\n+CPMS: (\"SM\",\"ME\"),(\"SM\",\"ME\"),(\"SM\")\r\n\r\nOK\r\n",
    );
    let packets = bound_reply("+CPMS", &lines);
    assert_eq!(
        packets,
        vec![Packet::StorageAreas(StorageAreas {
            read: vec!["SM".into(), "ME".into()],
            write: vec!["SM".into(), "ME".into()],
            receive: vec!["SM".into()],
        })]
    );
}

#[test]
fn service_center_in_both_encodings() {
    let gsm_form = parse_packet("OK", "+CSCA: \"+15550000\",145", "").unwrap();
    let ucs2_form = parse_packet(
        "OK",
        &format!("+CSCA: \"{}\",145", ucs2::encode("+15550000")),
        "",
    )
    .unwrap();
    match (gsm_form, ucs2_form) {
        (Some(Packet::SmscAddress(gsm_args)), Some(Packet::SmscAddress(ucs2_args))) => {
            assert_eq!(gsm_args[0], Value::from("+15550000"));
            let decoded = ucs2::decode(ucs2_args[0].as_str().unwrap()).unwrap();
            assert_eq!(decoded, "+15550000");
        }
        other => panic!("Expected two SmscAddress packets, got {:?}", other),
    }
}

#[test]
fn pdu_user_data_decodes() {
    let octets = [0xE8, 0x32, 0x9B, 0xFD, 0x46, 0x97, 0xD9, 0xEC, 0x37];
    assert_eq!(gsm::decode(&gsm::unpack(&octets, 10)), "hellohello");
}

#[tokio::test]
async fn framed_reader_over_duplex() {
    let (mut device, host) = tokio::io::duplex(64);
    let mut lines = FramedRead::new(host, LineCodec::new());

    device.write_all(b"\r\nRING\r\n\r\n+CMTI: \"SM\",").await.unwrap();
    device.write_all(b"4\r\nRING").await.unwrap();
    drop(device);

    let mut received = Vec::new();
    while let Some(line) = lines.next().await {
        received.push(line.unwrap());
    }
    assert_eq!(received, vec!["RING", "+CMTI: \"SM\",4", "RING"]);
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn chunking_does_not_change_lines(chunk in 1usize..32) {
        let whole = decode_chunked(LISTING, LISTING.len());
        let pieces = decode_chunked(LISTING, chunk);
        prop_assert_eq!(whole, pieces);
    }

    #[test]
    fn decoded_lines_are_trimmed_and_non_empty(input in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut codec = LineCodec::new();
        for line in decode_all(&mut codec, &input) {
            prop_assert!(!line.is_empty());
            prop_assert!(!line.contains('\r') && !line.contains('\n'));
            prop_assert!(line == DATA_PROMPT || line.trim() == line);
        }
    }

    #[test]
    fn ucs2_round_trips_any_text(text in "\\PC*") {
        prop_assert_eq!(ucs2::decode(&ucs2::encode(&text)).unwrap(), text);
    }
}
