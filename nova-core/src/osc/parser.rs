//! Zero-copy reader for the OSC wire format.
//!
//! Messages are `address, type tags, arguments`, each 4-byte aligned. The
//! address may be replaced by a 4-byte big-endian command number whose first
//! byte is zero. Bundles are `#bundle\0`, an 8-byte time tag, then a run of
//! `(u32 size, element)` pairs, where each element is a message or bundle.

use std::fmt;

use nova_types::TimeTag;

use super::error::{ParseError, ParseResult};

const BUNDLE_MARKER: &[u8; 8] = b"#bundle\0";
const BUNDLE_HEADER_LEN: usize = 16;

/// Deepest bundle nesting that is dispatched or rendered. A top-level bundle
/// is level 1; anything nested further is dropped as malformed.
pub const MAX_BUNDLE_DEPTH: usize = 64;

/// A parsed packet, borrowing from the buffer it was read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet<'a> {
    Message(Message<'a>),
    Bundle(Bundle<'a>),
}

/// Parse a complete packet or bundle element.
///
/// Bundles are not expanded here: their elements are read lazily by
/// [`Bundle::elements`], so one bad element does not hide its siblings.
pub fn parse_packet(data: &[u8]) -> ParseResult<Packet<'_>> {
    check_element_size(data.len())?;
    if data[0] == b'#' {
        Bundle::parse(data).map(Packet::Bundle)
    } else {
        Message::parse(data).map(Packet::Message)
    }
}

fn check_element_size(size: usize) -> ParseResult<()> {
    if size == 0 || size % 4 != 0 {
        return Err(ParseError::InvalidSize(size));
    }
    Ok(())
}

fn read_u32(data: &[u8]) -> Option<u32> {
    let bytes: [u8; 4] = data.get(..4)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

fn read_u64(data: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = data.get(..8)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Read a null-terminated, 4-byte padded string. Returns the string and the
/// bytes after its padding.
fn read_string(data: &[u8]) -> ParseResult<(&str, &[u8])> {
    let len = data
        .iter()
        .position(|&b| b == 0)
        .ok_or(ParseError::UnterminatedString)?;
    let padded = (len + 4) & !3;
    if padded > data.len() {
        return Err(ParseError::UnterminatedString);
    }
    let s = std::str::from_utf8(&data[..len]).map_err(|_| ParseError::InvalidUtf8)?;
    Ok((s, &data[padded..]))
}

// ── Messages ──────────────────────────────────────────────────────

/// Address of a message: either the precomputed command number or the
/// address string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address<'a> {
    Numeric(u32),
    Pattern(&'a str),
}

impl fmt::Display for Address<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Numeric(id) => write!(f, "#{}", id),
            Address::Pattern(s) => f.write_str(s),
        }
    }
}

/// One typed message argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    Int(i32),
    Float(f32),
    String(&'a str),
    Symbol(&'a str),
    Blob(&'a [u8]),
    Long(i64),
    Double(f64),
    Time(TimeTag),
    Char(char),
    Midi([u8; 4]),
    True,
    False,
    Nil,
    Infinitum,
}

impl Arg<'_> {
    /// The type tag character this argument was encoded with.
    pub fn tag(&self) -> char {
        match self {
            Arg::Int(_) => 'i',
            Arg::Float(_) => 'f',
            Arg::String(_) => 's',
            Arg::Symbol(_) => 'S',
            Arg::Blob(_) => 'b',
            Arg::Long(_) => 'h',
            Arg::Double(_) => 'd',
            Arg::Time(_) => 't',
            Arg::Char(_) => 'c',
            Arg::Midi(_) => 'm',
            Arg::True => 'T',
            Arg::False => 'F',
            Arg::Nil => 'N',
            Arg::Infinitum => 'I',
        }
    }
}

impl fmt::Display for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{}", v),
            Arg::Float(v) => write!(f, "{}f", v),
            Arg::String(s) => write!(f, "\"{}\"", s),
            Arg::Symbol(s) => write!(f, "'{}", s),
            Arg::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
            Arg::Long(v) => write!(f, "{}L", v),
            Arg::Double(v) => write!(f, "{}d", v),
            Arg::Time(t) => write!(f, "<time {}>", t),
            Arg::Char(c) => write!(f, "'{}'", c.escape_default()),
            Arg::Midi(m) => write!(f, "<midi {:02x} {:02x} {:02x} {:02x}>", m[0], m[1], m[2], m[3]),
            Arg::True => f.write_str("true"),
            Arg::False => f.write_str("false"),
            Arg::Nil => f.write_str("nil"),
            Arg::Infinitum => f.write_str("inf"),
        }
    }
}

/// A parsed message. Arguments are decoded eagerly, so a message that
/// parses has a complete, well-typed argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct Message<'a> {
    address: Address<'a>,
    type_tags: &'a str,
    args: Vec<Arg<'a>>,
}

impl<'a> Message<'a> {
    fn parse(data: &'a [u8]) -> ParseResult<Self> {
        let (address, rest) = if data[0] == 0 {
            let id = read_u32(data).ok_or(ParseError::InvalidSize(data.len()))?;
            (Address::Numeric(id), &data[4..])
        } else {
            let (s, rest) = read_string(data)?;
            (Address::Pattern(s), rest)
        };

        // Old-style messages carry no type tag string at all
        if rest.is_empty() {
            return Ok(Self {
                address,
                type_tags: "",
                args: Vec::new(),
            });
        }
        if rest[0] != b',' {
            return Err(ParseError::MissingTypeTags);
        }
        let (tags, mut payload) = read_string(rest)?;
        let type_tags = &tags[1..];

        let mut args = Vec::with_capacity(type_tags.len());
        for tag in type_tags.chars() {
            let (arg, remaining) = read_arg(tag, payload)?;
            args.push(arg);
            payload = remaining;
        }

        Ok(Self {
            address,
            type_tags,
            args,
        })
    }

    pub fn address(&self) -> Address<'a> {
        self.address
    }

    /// Type tags without the leading `,`.
    pub fn type_tags(&self) -> &'a str {
        self.type_tags
    }

    pub fn args(&self) -> &[Arg<'a>] {
        &self.args
    }

    /// Typed, sequential access to the arguments.
    pub fn arg_stream(&self) -> ArgStream<'_, 'a> {
        ArgStream {
            args: &self.args,
            index: 0,
        }
    }
}

fn read_arg(tag: char, data: &[u8]) -> ParseResult<(Arg<'_>, &[u8])> {
    let truncated = ParseError::Truncated { tag };
    let arg = match tag {
        'i' => {
            let v = read_u32(data).ok_or(truncated)?;
            return Ok((Arg::Int(v as i32), &data[4..]));
        }
        'f' => {
            let v = read_u32(data).ok_or(truncated)?;
            return Ok((Arg::Float(f32::from_bits(v)), &data[4..]));
        }
        'c' => {
            let v = read_u32(data).ok_or(truncated)?;
            let c = char::from_u32(v).unwrap_or(char::REPLACEMENT_CHARACTER);
            return Ok((Arg::Char(c), &data[4..]));
        }
        'm' => {
            let bytes: [u8; 4] = data
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .ok_or(truncated)?;
            return Ok((Arg::Midi(bytes), &data[4..]));
        }
        'h' => {
            let v = read_u64(data).ok_or(truncated)?;
            return Ok((Arg::Long(v as i64), &data[8..]));
        }
        'd' => {
            let v = read_u64(data).ok_or(truncated)?;
            return Ok((Arg::Double(f64::from_bits(v)), &data[8..]));
        }
        't' => {
            let v = read_u64(data).ok_or(truncated)?;
            return Ok((Arg::Time(TimeTag::from_raw(v)), &data[8..]));
        }
        's' | 'S' => {
            let (s, rest) = read_string(data).map_err(|e| match e {
                ParseError::UnterminatedString => truncated,
                other => other,
            })?;
            let arg = if tag == 's' { Arg::String(s) } else { Arg::Symbol(s) };
            return Ok((arg, rest));
        }
        'b' => {
            let size = read_u32(data).ok_or(truncated.clone())? as usize;
            let padded = size.checked_add(3).ok_or(truncated.clone())? & !3;
            let body = &data[4..];
            if padded > body.len() {
                return Err(truncated);
            }
            return Ok((Arg::Blob(&body[..size]), &body[padded..]));
        }
        'T' => Arg::True,
        'F' => Arg::False,
        'N' => Arg::Nil,
        'I' => Arg::Infinitum,
        other => return Err(ParseError::UnknownTypeTag(other)),
    };
    Ok((arg, data))
}

/// Sequential typed reader over a message's arguments. Each accessor
/// consumes one argument and fails if it is absent or of another type.
pub struct ArgStream<'m, 'a> {
    args: &'m [Arg<'a>],
    index: usize,
}

impl<'a> ArgStream<'_, 'a> {
    fn next_arg(&mut self) -> ParseResult<Arg<'a>> {
        let arg = self
            .args
            .get(self.index)
            .copied()
            .ok_or(ParseError::MissingArgument { index: self.index })?;
        self.index += 1;
        Ok(arg)
    }

    fn mismatch(&self, expected: char, found: &Arg<'_>) -> ParseError {
        ParseError::WrongArgumentType {
            index: self.index - 1,
            expected,
            found: found.tag(),
        }
    }

    pub fn int32(&mut self) -> ParseResult<i32> {
        match self.next_arg()? {
            Arg::Int(v) => Ok(v),
            other => Err(self.mismatch('i', &other)),
        }
    }

    pub fn float32(&mut self) -> ParseResult<f32> {
        match self.next_arg()? {
            Arg::Float(v) => Ok(v),
            other => Err(self.mismatch('f', &other)),
        }
    }

    /// Accepts both strings and symbols.
    pub fn string(&mut self) -> ParseResult<&'a str> {
        match self.next_arg()? {
            Arg::String(s) | Arg::Symbol(s) => Ok(s),
            other => Err(self.mismatch('s', &other)),
        }
    }

    pub fn blob(&mut self) -> ParseResult<&'a [u8]> {
        match self.next_arg()? {
            Arg::Blob(b) => Ok(b),
            other => Err(self.mismatch('b', &other)),
        }
    }

    pub fn remaining(&self) -> usize {
        self.args.len() - self.index
    }
}

// ── Bundles ───────────────────────────────────────────────────────

/// A parsed bundle header. Elements stay unparsed until iterated.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle<'a> {
    time_tag: TimeTag,
    elements: &'a [u8],
}

impl<'a> Bundle<'a> {
    fn parse(data: &'a [u8]) -> ParseResult<Self> {
        if !data.starts_with(BUNDLE_MARKER) {
            return Err(ParseError::UnknownBundleMarker);
        }
        let raw = read_u64(&data[BUNDLE_MARKER.len()..]).ok_or(ParseError::Truncated { tag: 't' })?;
        Ok(Self {
            time_tag: TimeTag::from_raw(raw),
            elements: &data[BUNDLE_HEADER_LEN..],
        })
    }

    pub fn time_tag(&self) -> TimeTag {
        self.time_tag
    }

    /// Elements in wire order. A malformed element yields an error and
    /// iteration continues with the next one; a malformed size field ends
    /// the iteration, since the following boundaries are unknown.
    pub fn elements(&self) -> BundleElements<'a> {
        BundleElements {
            remaining: self.elements,
        }
    }
}

pub struct BundleElements<'a> {
    remaining: &'a [u8],
}

impl<'a> Iterator for BundleElements<'a> {
    type Item = ParseResult<Packet<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        let Some(size) = read_u32(self.remaining) else {
            let leftover = self.remaining.len();
            self.remaining = &[];
            return Some(Err(ParseError::InvalidSize(leftover)));
        };
        let size = size as usize;
        let body = &self.remaining[4..];
        if let Err(e) = check_element_size(size) {
            self.remaining = &[];
            return Some(Err(e));
        }
        if size > body.len() {
            self.remaining = &[];
            return Some(Err(ParseError::ElementOverrun {
                claimed: size,
                remaining: body.len(),
            }));
        }
        let (element, rest) = body.split_at(size);
        self.remaining = rest;
        Some(parse_packet(element))
    }
}

// ── Dump rendering ────────────────────────────────────────────────

impl fmt::Display for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ,{}", self.address, self.type_tags)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

fn write_bundle(bundle: &Bundle<'_>, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
    writeln!(f, "#bundle {} [", bundle.time_tag)?;
    for element in bundle.elements() {
        write!(f, "{:indent$}", "", indent = level * 2)?;
        match element {
            Ok(Packet::Message(msg)) => writeln!(f, "{}", msg)?,
            Ok(Packet::Bundle(_)) if level >= MAX_BUNDLE_DEPTH => {
                let e = ParseError::NestingTooDeep { limit: MAX_BUNDLE_DEPTH };
                writeln!(f, "<malformed: {}>", e)?
            }
            Ok(Packet::Bundle(inner)) => write_bundle(&inner, f, level + 1)?,
            Err(e) => writeln!(f, "<malformed: {}>", e)?,
        }
    }
    writeln!(f, "{:indent$}]", "", indent = (level - 1) * 2)
}

impl fmt::Display for Bundle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_bundle(self, f, 1)
    }
}

impl fmt::Display for Packet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packet::Message(msg) => writeln!(f, "{}", msg),
            Packet::Bundle(bundle) => write!(f, "{}", bundle),
        }
    }
}
