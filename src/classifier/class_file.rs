//! # Class File Reader
//!
//! Reads just enough of the JVM class-file format to classify a class:
//! the class name, superclass, implemented interfaces and the
//! runtime-visible annotations with their string-valued elements. Fields,
//! methods and every other attribute are skipped without interpretation.

use super::class_descriptor::{Annotation, ClassDescriptor};
use thiserror::Error;

const MAGIC: u32 = 0xCAFE_BABE;
const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
/// Nesting limit for annotation element values (arrays and annotations)
pub const MAX_ELEMENT_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassFileError {
    #[error("Not a class file (magic {0:#010x})")]
    BadMagic(u32),
    #[error("Class file truncated at offset {offset}")]
    Truncated { offset: usize },
    #[error("Unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: usize },
    #[error("Constant pool index {index} does not reference a {expected} entry")]
    BadConstantReference { index: u16, expected: &'static str },
    #[error("Unknown annotation element tag {0:?}")]
    UnknownElementTag(char),
    #[error("Annotation element values nested deeper than {limit}")]
    TooDeep { limit: usize },
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class(u16),
    /// Numeric and reference entries the reader never dereferences
    Other,
    /// Second slot of an 8-byte constant
    Unusable,
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ClassFileError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(ClassFileError::Truncated {
                offset: self.offset,
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassFileError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassFileError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassFileError> {
        self.take(len).map(|_| ())
    }
}

struct ConstantPool(Vec<Constant>);

impl ConstantPool {
    fn read(reader: &mut Reader<'_>) -> Result<Self, ClassFileError> {
        let count = reader.u16()? as usize;
        // Index 0 is never valid
        let mut entries = vec![Constant::Unusable];
        while entries.len() < count {
            let index = entries.len();
            let tag = reader.u8()?;
            match tag {
                1 => {
                    let len = reader.u16()? as usize;
                    let raw = reader.take(len)?;
                    entries.push(Constant::Utf8(String::from_utf8_lossy(raw).into_owned()));
                }
                7 => entries.push(Constant::Class(reader.u16()?)),
                3 | 4 => {
                    reader.skip(4)?;
                    entries.push(Constant::Other);
                }
                5 | 6 => {
                    reader.skip(8)?;
                    entries.push(Constant::Other);
                    entries.push(Constant::Unusable);
                }
                8 | 16 | 19 | 20 => {
                    reader.skip(2)?;
                    entries.push(Constant::Other);
                }
                9 | 10 | 11 | 12 | 17 | 18 => {
                    reader.skip(4)?;
                    entries.push(Constant::Other);
                }
                15 => {
                    reader.skip(3)?;
                    entries.push(Constant::Other);
                }
                tag => return Err(ClassFileError::UnknownConstantTag { tag, index }),
            }
        }
        Ok(Self(entries))
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.0.get(index as usize) {
            Some(Constant::Utf8(value)) => Ok(value),
            _ => Err(ClassFileError::BadConstantReference {
                index,
                expected: "Utf8",
            }),
        }
    }

    fn class_name(&self, index: u16) -> Result<String, ClassFileError> {
        match self.0.get(index as usize) {
            Some(Constant::Class(name_index)) => Ok(self.utf8(*name_index)?.replace('/', ".")),
            _ => Err(ClassFileError::BadConstantReference {
                index,
                expected: "Class",
            }),
        }
    }
}

/// `Ljakarta/ws/rs/Path;` -> `jakarta.ws.rs.Path`
fn descriptor_to_name(descriptor: &str) -> String {
    descriptor
        .strip_prefix('L')
        .and_then(|d| d.strip_suffix(';'))
        .unwrap_or(descriptor)
        .replace('/', ".")
}

fn skip_members(reader: &mut Reader<'_>) -> Result<(), ClassFileError> {
    let count = reader.u16()?;
    for _ in 0..count {
        // access_flags, name_index, descriptor_index
        reader.skip(6)?;
        skip_attributes(reader)?;
    }
    Ok(())
}

fn skip_attributes(reader: &mut Reader<'_>) -> Result<(), ClassFileError> {
    let count = reader.u16()?;
    for _ in 0..count {
        reader.skip(2)?;
        let len = reader.u32()? as usize;
        reader.skip(len)?;
    }
    Ok(())
}

/// Read one element value, returning it when it is a string constant.
fn read_element_value(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<Option<String>, ClassFileError> {
    if depth > MAX_ELEMENT_DEPTH {
        return Err(ClassFileError::TooDeep {
            limit: MAX_ELEMENT_DEPTH,
        });
    }
    let tag = reader.u8()? as char;
    match tag {
        's' => {
            let index = reader.u16()?;
            Ok(Some(pool.utf8(index)?.to_string()))
        }
        'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 'c' => {
            reader.skip(2)?;
            Ok(None)
        }
        'e' => {
            reader.skip(4)?;
            Ok(None)
        }
        '@' => {
            read_annotation(reader, pool, depth + 1)?;
            Ok(None)
        }
        '[' => {
            let count = reader.u16()?;
            let mut first = None;
            for _ in 0..count {
                let value = read_element_value(reader, pool, depth + 1)?;
                if first.is_none() {
                    first = value;
                }
            }
            // Single-element string arrays read like a plain string
            Ok(if count == 1 { first } else { None })
        }
        other => Err(ClassFileError::UnknownElementTag(other)),
    }
}

fn read_annotation(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
    depth: usize,
) -> Result<Annotation, ClassFileError> {
    let type_index = reader.u16()?;
    let mut annotation = Annotation::new(descriptor_to_name(pool.utf8(type_index)?));
    let pairs = reader.u16()?;
    for _ in 0..pairs {
        let element = pool.utf8(reader.u16()?)?.to_string();
        if let Some(value) = read_element_value(reader, pool, depth)? {
            annotation.values.insert(element, value);
        }
    }
    Ok(annotation)
}

/// Parse class-file bytes into a [`ClassDescriptor`].
pub fn parse_class(bytes: &[u8]) -> Result<ClassDescriptor, ClassFileError> {
    let mut reader = Reader::new(bytes);

    let magic = reader.u32()?;
    if magic != MAGIC {
        return Err(ClassFileError::BadMagic(magic));
    }
    // minor_version, major_version
    reader.skip(4)?;

    let pool = ConstantPool::read(&mut reader)?;

    // access_flags
    reader.skip(2)?;
    let mut class = ClassDescriptor::new(pool.class_name(reader.u16()?)?);

    let super_index = reader.u16()?;
    if super_index != 0 {
        class.superclass = Some(pool.class_name(super_index)?);
    }

    let interface_count = reader.u16()?;
    for _ in 0..interface_count {
        let index = reader.u16()?;
        class.interfaces.push(pool.class_name(index)?);
    }

    skip_members(&mut reader)?; // fields
    skip_members(&mut reader)?; // methods

    let attribute_count = reader.u16()?;
    for _ in 0..attribute_count {
        let name = pool.utf8(reader.u16()?)?;
        let len = reader.u32()? as usize;
        if name != RUNTIME_VISIBLE_ANNOTATIONS {
            reader.skip(len)?;
            continue;
        }
        let count = reader.u16()?;
        for _ in 0..count {
            class.annotations.push(read_annotation(&mut reader, &pool, 0)?);
        }
    }

    Ok(class)
}
