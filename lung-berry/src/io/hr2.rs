//! HR2 体数据格式的读取 (以及测试与转换工具所需的写入).
//!
//! HR2 是一种带标签的私有格式, 文件结构如下:
//!
//! ```text
//! 'H' 'R' <任意非 '3' 的字节>
//! 重复若干次: [标签名长度: u8][标签名][字段长度][字段内容]
//! ImageData 标签之后: zlib 压缩的小端 f32 数组
//! ```
//!
//! # 注意
//!
//! 1. 字段长度为小端序无符号整数, 最多 4 个字节. 读到 0 字节时提前结束, 且该 0 字节
//!   被一并消耗; 读满 4 个字节时不再消耗额外的字节. 因此低位字节为 0 的长度无法表示,
//!   写入时会在字段末尾补齐 (文本字段补空格, 压缩数据补 0).
//! 2. 除 ImageData 外, 字段内容均为 ASCII. `Size`, `Origin`, `Spacing` 为空格分隔的数值,
//!   顺序与 ITK 相同 (x 变化最快).
//! 3. ImageData 的字段长度是压缩数据的字节数. 读取时不依赖它, 而是一直解压到 zlib
//!   流结束.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use itertools::Itertools;
use ndarray::{Array3, ArrayView3};
use thiserror::Error;

use crate::consts::INFLATE_CHUNK;
use crate::Idx3d;

/// HR2 读写错误.
#[derive(Error, Debug)]
pub enum Hr2Error {
    /// 魔数不符.
    #[error("not an HR2 file")]
    NotHr2,

    /// 无法识别的标签.
    #[error("not an HR2 tag: '{0}'")]
    UnknownTag(String),

    /// 不支持的像素类型. 目前只支持 `float`.
    #[error("unknown pixel type: '{0}'")]
    UnknownPixelType(String),

    /// 不支持的压缩方式. 目前只支持 `ZLib`.
    #[error("unknown compression: '{0}'")]
    UnknownCompression(String),

    /// 数值字段无法解析.
    #[error("malformed number in {tag} field: '{field}'")]
    MalformedNumber {
        /// 所在标签.
        tag: Hr2Tag,
        /// 字段内容.
        field: String,
    },

    /// 缺少必需的字段.
    #[error("missing {0} field")]
    MissingField(Hr2Tag),

    /// `Size` 的元素个数与维数不符.
    #[error("number of size elements ({len}) does not match dimension ({dimension})")]
    SizeMismatch {
        /// 维数.
        dimension: usize,
        /// 元素个数.
        len: usize,
    },

    /// `Origin` 的元素个数与维数不符.
    #[error("number of origin elements ({len}) does not match dimension ({dimension})")]
    OriginMismatch {
        /// 维数.
        dimension: usize,
        /// 元素个数.
        len: usize,
    },

    /// `Spacing` 的元素个数与维数不符.
    #[error("number of spacing elements ({len}) does not match dimension ({dimension})")]
    SpacingMismatch {
        /// 维数.
        dimension: usize,
        /// 元素个数.
        len: usize,
    },

    /// 数据不能按头部描述的尺寸组织为三维体数据.
    #[error("cannot arrange {floats} floats as a volume of size {size:?}")]
    Shape {
        /// 头部声明的尺寸 (ITK 顺序).
        size: Vec<usize>,
        /// 实际的 `f32` 个数.
        floats: usize,
    },

    /// zlib 数据损坏或不完整.
    #[error("error inflating: {0}")]
    Inflate(#[source] io::Error),

    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// HR2 读写结果.
pub type Hr2Result<T> = Result<T, Hr2Error>;

/// HR2 标签.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hr2Tag {
    /// 像素类型.
    PixelType,
    /// 压缩方式.
    Compression,
    /// 维数.
    Dimension,
    /// 各维尺寸.
    Size,
    /// 各维原点.
    Origin,
    /// 各维体素间距.
    Spacing,
    /// 压缩数据. 总是最后一个标签.
    ImageData,
}

impl Hr2Tag {
    /// 文件中的标签名.
    pub const fn name(self) -> &'static str {
        match self {
            Self::PixelType => "PixelType",
            Self::Compression => "Compression",
            Self::Dimension => "Dimension",
            Self::Size => "Size",
            Self::Origin => "Origin",
            Self::Spacing => "Spacing",
            Self::ImageData => "ImageData",
        }
    }

    fn from_name(name: &[u8]) -> Option<Self> {
        [
            Self::PixelType,
            Self::Compression,
            Self::Dimension,
            Self::Size,
            Self::Origin,
            Self::Spacing,
            Self::ImageData,
        ]
        .into_iter()
        .find(|t| t.name().as_bytes() == name)
    }
}

impl fmt::Display for Hr2Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 像素类型.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hr2PixelType {
    /// 32 位浮点数.
    #[default]
    Float,
}

impl Hr2PixelType {
    /// 文件中的名称.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Float => "float",
        }
    }
}

/// 压缩方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hr2Compression {
    /// zlib.
    #[default]
    ZLib,
}

impl Hr2Compression {
    /// 文件中的名称.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ZLib => "ZLib",
        }
    }
}

/// HR2 头部.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hr2Header {
    /// 像素类型.
    pub pixel_type: Hr2PixelType,

    /// 压缩方式.
    pub compression: Hr2Compression,

    /// 维数.
    pub dimension: usize,

    /// 压缩数据的字节数.
    pub pixel_data_length: usize,

    /// 各维尺寸, ITK 顺序.
    pub size: Vec<usize>,

    /// 各维原点, ITK 顺序.
    pub origin: Vec<f64>,

    /// 各维体素间距, ITK 顺序.
    pub spacing: Vec<f64>,
}

impl Hr2Header {
    /// 三维体数据的头部. `shape` 按 `(z, h, w)` 组织, `origin` 与 `spacing` 按 ITK
    /// 顺序 `(x, y, z)` 组织.
    pub fn volume((z, h, w): Idx3d, origin: [f64; 3], spacing: [f64; 3]) -> Self {
        Self {
            pixel_type: Hr2PixelType::Float,
            compression: Hr2Compression::ZLib,
            dimension: 3,
            pixel_data_length: 0,
            size: vec![w, h, z],
            origin: origin.to_vec(),
            spacing: spacing.to_vec(),
        }
    }

    /// 体素个数.
    pub fn voxels(&self) -> usize {
        self.size.iter().product()
    }

    /// 三维体数据按 `(z, h, w)` 组织的形状. 维数不为 3 时返回 `None`.
    pub fn shape(&self) -> Option<Idx3d> {
        match self.size[..] {
            [x, y, z] if self.dimension == 3 => Some((z, y, x)),
            _ => None,
        }
    }
}

/// 读入的 HR2 体数据.
#[derive(Clone, Debug, PartialEq)]
pub struct Hr2Volume {
    header: Hr2Header,
    data: Vec<f32>,
}

impl Hr2Volume {
    /// 由头部和数据构建.
    pub fn new(header: Hr2Header, data: Vec<f32>) -> Self {
        Self { header, data }
    }

    /// 由按 `(z, h, w)` 组织的体数据构建.
    pub fn from_array3(data: ArrayView3<f32>, origin: [f64; 3], spacing: [f64; 3]) -> Self {
        Self {
            header: Hr2Header::volume(data.dim(), origin, spacing),
            data: data.iter().copied().collect(),
        }
    }

    /// 头部.
    #[inline]
    pub fn header(&self) -> &Hr2Header {
        &self.header
    }

    /// 扁平的数据, ITK 顺序 (x 变化最快).
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// 拆分为头部和数据.
    pub fn into_parts(self) -> (Hr2Header, Vec<f32>) {
        (self.header, self.data)
    }

    /// 转换为按 `(z, h, w)` 组织的三维数组.
    pub fn into_array3(self) -> Hr2Result<Array3<f32>> {
        let floats = self.data.len();
        let shape = self
            .header
            .shape()
            .filter(|_| self.header.voxels() == floats)
            .ok_or_else(|| Hr2Error::Shape {
                size: self.header.size.clone(),
                floats,
            })?;
        Array3::from_shape_vec(shape, self.data).map_err(|_| Hr2Error::Shape {
            size: self.header.size,
            floats,
        })
    }

    /// 以 HR2 格式写出.
    pub fn write_to<W: Write>(&self, w: W) -> Hr2Result<()> {
        write_hr2(w, &self.header, &self.data)
    }
}

/// 从路径 `path` 读取 HR2 文件.
pub fn read_hr2<P: AsRef<Path>>(path: P) -> Hr2Result<Hr2Volume> {
    let file = File::open(path)?;
    read_hr2_from(BufReader::new(file))
}

/// 从 `r` 读取 HR2 数据: 检查魔数, 读取并检查头部, 最后解压数据.
pub fn read_hr2_from<R: Read>(mut r: R) -> Hr2Result<Hr2Volume> {
    if !is_hr2_format(&mut r)? {
        return Err(Hr2Error::NotHr2);
    }
    let header = read_header(&mut r)?;
    check_header(&header)?;

    let bytes = inflate(&mut r)?;
    let data: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    log::debug!("Inflated {} bytes into {} floats", bytes.len(), data.len());
    Ok(Hr2Volume { header, data })
}

/// 读取 3 个字节并检查魔数: 前两个字节为 `HR`, 第三个字节不为 `3`.
///
/// 数据不足 3 个字节时返回 `Ok(false)`.
pub fn is_hr2_format<R: Read>(r: &mut R) -> Hr2Result<bool> {
    let mut magic = [0u8; 3];
    match r.read_exact(&mut magic) {
        Ok(()) => Ok(magic[0] == b'H' && magic[1] == b'R' && magic[2] != b'3'),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// 读取魔数之后的全部头部字段, 直到 (并包括) ImageData 的字段长度.
///
/// 像素类型和压缩方式在读到时立即检查. `PixelType`, `Compression`, `Dimension`
/// 缺失时返回 `Err(Hr2Error::MissingField)`; 其余一致性检查见 [`check_header`].
pub fn read_header<R: Read>(r: &mut R) -> Hr2Result<Hr2Header> {
    let mut pixel_type = None;
    let mut compression = None;
    let mut dimension = None;
    let mut header = Hr2Header {
        pixel_type: Hr2PixelType::Float,
        compression: Hr2Compression::ZLib,
        dimension: 0,
        pixel_data_length: 0,
        size: vec![],
        origin: vec![],
        spacing: vec![],
    };

    loop {
        let tag = read_tag(r)?;
        let len = read_field_length(r)?;
        if tag == Hr2Tag::ImageData {
            header.pixel_data_length = len;
            break;
        }

        // 字段长度不可信, 按实际读到的数据分配.
        let mut buf = Vec::new();
        r.by_ref().take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("{tag} field declares {len} bytes, only {} available", buf.len()),
            )
            .into());
        }
        let field = String::from_utf8_lossy(&buf);
        let field = field.trim_matches(|c: char| c == '\0' || c.is_ascii_whitespace());
        log::debug!("HR2 {tag}: '{field}'");

        match tag {
            Hr2Tag::PixelType => {
                pixel_type = match field {
                    "float" => Some(Hr2PixelType::Float),
                    _ => return Err(Hr2Error::UnknownPixelType(field.to_string())),
                }
            }
            Hr2Tag::Compression => {
                compression = match field {
                    "ZLib" => Some(Hr2Compression::ZLib),
                    _ => return Err(Hr2Error::UnknownCompression(field.to_string())),
                }
            }
            Hr2Tag::Dimension => dimension = Some(parse_number(tag, field)?),
            Hr2Tag::Size => header.size = parse_list(tag, field)?,
            Hr2Tag::Origin => header.origin = parse_list(tag, field)?,
            Hr2Tag::Spacing => header.spacing = parse_list(tag, field)?,
            Hr2Tag::ImageData => unreachable!(),
        }
    }

    header.pixel_type = pixel_type.ok_or(Hr2Error::MissingField(Hr2Tag::PixelType))?;
    header.compression = compression.ok_or(Hr2Error::MissingField(Hr2Tag::Compression))?;
    header.dimension = dimension.ok_or(Hr2Error::MissingField(Hr2Tag::Dimension))?;
    Ok(header)
}

/// 检查头部的一致性: `Size`, `Origin`, `Spacing` 的元素个数必须都等于维数.
pub fn check_header(header: &Hr2Header) -> Hr2Result<()> {
    let dimension = header.dimension;
    if header.size.len() != dimension {
        return Err(Hr2Error::SizeMismatch {
            dimension,
            len: header.size.len(),
        });
    }
    if header.origin.len() != dimension {
        return Err(Hr2Error::OriginMismatch {
            dimension,
            len: header.origin.len(),
        });
    }
    if header.spacing.len() != dimension {
        return Err(Hr2Error::SpacingMismatch {
            dimension,
            len: header.spacing.len(),
        });
    }
    Ok(())
}

/// 以 HR2 格式写出 `header` 和 `data`. `header.pixel_data_length` 被忽略, 以实际的
/// 压缩数据长度为准.
pub fn write_hr2<W: Write>(w: W, header: &Hr2Header, data: &[f32]) -> Hr2Result<()> {
    check_header(header)?;

    let mut e = ZlibEncoder::new(Vec::with_capacity(data.len()), Compression::default());
    for v in data {
        e.write_all(&v.to_le_bytes())?;
    }
    let mut compressed = e.finish()?;
    compressed.resize(representable_len(compressed.len())?, 0);

    let mut w = BufWriter::new(w);
    w.write_all(b"HR2")?;
    write_text_field(&mut w, Hr2Tag::PixelType, header.pixel_type.name())?;
    write_text_field(&mut w, Hr2Tag::Dimension, &header.dimension.to_string())?;
    write_text_field(&mut w, Hr2Tag::Size, &header.size.iter().join(" "))?;
    write_text_field(&mut w, Hr2Tag::Origin, &header.origin.iter().join(" "))?;
    write_text_field(&mut w, Hr2Tag::Spacing, &header.spacing.iter().join(" "))?;
    write_text_field(&mut w, Hr2Tag::Compression, header.compression.name())?;
    write_field(&mut w, Hr2Tag::ImageData, &compressed)?;
    w.flush()?;
    Ok(())
}

fn read_byte<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut b = [0u8];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

fn read_tag<R: Read>(r: &mut R) -> Hr2Result<Hr2Tag> {
    let len = read_byte(r)? as usize;
    let mut name = vec![0u8; len];
    r.read_exact(&mut name)?;
    Hr2Tag::from_name(&name)
        .ok_or_else(|| Hr2Error::UnknownTag(String::from_utf8_lossy(&name).into_owned()))
}

/// 读取字段长度: 最多 4 个小端字节, 遇到 0 字节时提前结束.
fn read_field_length<R: Read>(r: &mut R) -> io::Result<usize> {
    let mut bytes = [0u8; 4];
    for slot in bytes.iter_mut() {
        let b = read_byte(r)?;
        if b == 0 {
            break;
        }
        *slot = b;
    }
    Ok(u32::from_le_bytes(bytes) as usize)
}

/// 有效 (最高非零字节及以下) 的字节数.
fn significant_bytes(len: u32) -> usize {
    4 - (len.leading_zeros() / 8) as usize
}

/// 不小于 `len` 且可以无歧义地写出的最小字段长度.
fn representable_len(len: usize) -> io::Result<usize> {
    let too_long = || io::Error::new(ErrorKind::InvalidInput, "HR2 field too long");
    let mut n = u32::try_from(len).map_err(|_| too_long())?;
    loop {
        if n.to_le_bytes()[..significant_bytes(n)].iter().all(|&b| b != 0) {
            return Ok(n as usize);
        }
        n = n.checked_add(1).ok_or_else(too_long)?;
    }
}

fn write_field_length<W: Write>(w: &mut W, len: usize) -> io::Result<()> {
    if representable_len(len)? != len {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("HR2 field length {len} cannot be encoded"),
        ));
    }
    let len = len as u32;
    let n = significant_bytes(len);
    w.write_all(&len.to_le_bytes()[..n])?;
    if n < 4 {
        w.write_all(&[0])?;
    }
    Ok(())
}

fn write_field<W: Write>(w: &mut W, tag: Hr2Tag, payload: &[u8]) -> io::Result<()> {
    let name = tag.name().as_bytes();
    w.write_all(&[name.len() as u8])?;
    w.write_all(name)?;
    write_field_length(w, payload.len())?;
    w.write_all(payload)
}

fn write_text_field<W: Write>(w: &mut W, tag: Hr2Tag, field: &str) -> io::Result<()> {
    let mut payload = field.as_bytes().to_vec();
    payload.resize(representable_len(payload.len())?, b' ');
    write_field(w, tag, &payload)
}

fn parse_number(tag: Hr2Tag, field: &str) -> Hr2Result<usize> {
    field.parse().map_err(|_| Hr2Error::MalformedNumber {
        tag,
        field: field.to_string(),
    })
}

fn parse_list<T: std::str::FromStr>(tag: Hr2Tag, field: &str) -> Hr2Result<Vec<T>> {
    field
        .split_ascii_whitespace()
        .map(str::parse)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|_| Hr2Error::MalformedNumber {
            tag,
            field: field.to_string(),
        })
}

/// 读满 `buf`, 除非先遇到数据末尾. 返回读到的字节数.
fn read_chunk<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// 按 `INFLATE_CHUNK` 大小的块解压, 直到 zlib 流结束. 流结束之后的数据被忽略.
fn inflate<R: Read>(r: &mut R) -> Hr2Result<Vec<u8>> {
    let mut z = Decompress::new(true);
    let mut input = vec![0u8; INFLATE_CHUNK];
    let mut output = vec![0u8; INFLATE_CHUNK];
    let mut inflated = Vec::new();

    loop {
        let avail = read_chunk(r, &mut input)?;
        if avail == 0 {
            return Err(Hr2Error::Inflate(io::Error::new(
                ErrorKind::UnexpectedEof,
                "zlib stream ended prematurely",
            )));
        }

        let mut consumed = 0;
        loop {
            let (before_in, before_out) = (z.total_in(), z.total_out());
            let status = z
                .decompress(&input[consumed..avail], &mut output, FlushDecompress::None)
                .map_err(|e| Hr2Error::Inflate(io::Error::new(ErrorKind::InvalidData, e)))?;
            consumed += (z.total_in() - before_in) as usize;
            let have = (z.total_out() - before_out) as usize;
            inflated.extend_from_slice(&output[..have]);

            if status == Status::StreamEnd {
                return Ok(inflated);
            }
            // 输出缓冲区未满, 说明这一块输入已经用完.
            if have < output.len() {
                break;
            }
        }
    }
}
