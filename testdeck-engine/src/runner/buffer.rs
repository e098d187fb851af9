// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use bytes::BytesMut;

/// Accumulates raw output chunks and yields complete lines.
///
/// Chunks may split a line (or a UTF-8 code point) anywhere; bytes are only
/// converted to text once a full line is available. The trailing segment of
/// the stream, if the process exits without a final newline, is recovered
/// with [`LineBuffer::flush`].
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends one chunk of raw output.
    pub(crate) fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Removes and returns the next complete line, without its newline.
    /// A trailing carriage return is stripped as well.
    pub(crate) fn pop_line(&mut self) -> Option<String> {
        let newline = self.buf.iter().position(|&byte| byte == b'\n')?;
        let line = self.buf.split_to(newline + 1);
        let mut end = line.len() - 1;
        if end > 0 && line[end - 1] == b'\r' {
            end -= 1;
        }
        Some(String::from_utf8_lossy(&line[..end]).into_owned())
    }

    /// Takes whatever is left in the buffer as a final, newline-less line.
    pub(crate) fn flush(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = self.buf.split();
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn drain(buffer: &mut LineBuffer, into: &mut Vec<String>) {
        while let Some(line) = buffer.pop_line() {
            into.push(line);
        }
    }

    #[test]
    fn lines_across_chunk_boundaries() {
        let mut buffer = LineBuffer::new();
        let mut lines = Vec::new();

        buffer.extend(b"{\"event\":\"test.pre");
        drain(&mut buffer, &mut lines);
        assert!(lines.is_empty());

        buffer.extend(b"pared\"}\n{\"event\":");
        drain(&mut buffer, &mut lines);
        assert_eq!(lines, ["{\"event\":\"test.prepared\"}"]);

        buffer.extend(b"\"test.passed\"}\n");
        drain(&mut buffer, &mut lines);
        assert_eq!(
            lines,
            ["{\"event\":\"test.prepared\"}", "{\"event\":\"test.passed\"}"]
        );
        assert_eq!(buffer.flush(), None);
    }

    #[test]
    fn flush_recovers_trailing_segment() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"a\nb");
        assert_eq!(buffer.pop_line().as_deref(), Some("a"));
        assert_eq!(buffer.pop_line(), None);
        assert_eq!(buffer.flush().as_deref(), Some("b"));
        assert_eq!(buffer.flush(), None);
    }

    #[test]
    fn crlf_is_stripped() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"line one\r\nline two\n");
        assert_eq!(buffer.pop_line().as_deref(), Some("line one"));
        assert_eq!(buffer.pop_line().as_deref(), Some("line two"));
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let text = "t\u{e9}st\n";
        let bytes = text.as_bytes();
        // Split inside the two-byte 'é'.
        let mut buffer = LineBuffer::new();
        buffer.extend(&bytes[..2]);
        assert_eq!(buffer.pop_line(), None);
        buffer.extend(&bytes[2..]);
        assert_eq!(buffer.pop_line().as_deref(), Some("t\u{e9}st"));
    }

    #[test]
    fn chunked_stream_decodes_same_events_as_one_chunk() {
        // Same property, end to end through the codec.
        let stream = concat!(
            r#"{"event":"suite.started","data":{"name":"S","count":1}}"#,
            "\n",
            r#"{"event":"test.prepared","data":{"test":"S::T1"}}"#,
            "\n",
            r#"{"event":"test.passed","data":{"test":"S::T1"}}"#,
        );

        let decode_all = |chunks: &[&[u8]]| {
            let mut buffer = LineBuffer::new();
            let mut events = Vec::new();
            let mut decode = |line: String| {
                if let Some(decoded) = testdeck_protocol::decode_line(&line).unwrap() {
                    events.push(decoded.event);
                }
            };
            for chunk in chunks {
                buffer.extend(chunk);
                while let Some(line) = buffer.pop_line() {
                    decode(line);
                }
            }
            if let Some(line) = buffer.flush() {
                decode(line);
            }
            events
        };

        let whole = decode_all(&[stream.as_bytes()]);
        assert_eq!(whole.len(), 3);

        // Split mid-line, mid-key, and right at a newline.
        let bytes = stream.as_bytes();
        let chunked = decode_all(&[&bytes[..10], &bytes[10..57], &bytes[57..58], &bytes[58..]]);
        assert_eq!(whole, chunked);
    }

    proptest! {
        #[test]
        fn arbitrary_chunk_boundaries_preserve_lines(
            lines in prop::collection::vec("[ -~]{0,40}", 0..8),
            chunk_sizes in prop::collection::vec(1usize..16, 0..128),
        ) {
            let input = lines.join("\n");
            let bytes = input.as_bytes();

            let mut whole = LineBuffer::new();
            whole.extend(bytes);
            let mut expected = Vec::new();
            drain(&mut whole, &mut expected);
            if let Some(rest) = whole.flush() {
                expected.push(rest);
            }

            let mut chunked = LineBuffer::new();
            let mut actual = Vec::new();
            let mut pos = 0;
            for size in chunk_sizes {
                if pos >= bytes.len() {
                    break;
                }
                let end = (pos + size).min(bytes.len());
                chunked.extend(&bytes[pos..end]);
                drain(&mut chunked, &mut actual);
                pos = end;
            }
            if pos < bytes.len() {
                chunked.extend(&bytes[pos..]);
                drain(&mut chunked, &mut actual);
            }
            if let Some(rest) = chunked.flush() {
                actual.push(rest);
            }

            prop_assert_eq!(actual, expected);
        }
    }
}
