#![allow(dead_code)]

use bytes::Bytes;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

use imgprobe::{ByteDemand, ImageFormat, SizeResult};

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes
}

pub fn gif_bytes(width: u16, height: u16) -> Vec<u8> {
    let mut bytes = b"GIF89a".to_vec();
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes
}

pub fn bmp_bytes(width: i32, height: i32) -> Vec<u8> {
    let mut bytes = b"BM".to_vec();
    bytes.extend_from_slice(&[0; 12]);
    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&width.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes
}

pub fn psd_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = b"8BPS\x00\x01".to_vec();
    bytes.extend_from_slice(&[0; 6]);
    bytes.extend_from_slice(&3u16.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes
}

/// Icon directory; a stored 0 stands for 256.
pub fn ico_bytes(sizes: &[(u8, u8)]) -> Vec<u8> {
    let mut bytes = vec![0, 0, 1, 0];
    bytes.extend_from_slice(&(sizes.len() as u16).to_le_bytes());
    for &(width, height) in sizes {
        let mut entry = [0u8; 16];
        entry[0] = width;
        entry[1] = height;
        entry[4..6].copy_from_slice(&1u16.to_le_bytes());
        entry[6..8].copy_from_slice(&32u16.to_le_bytes());
        bytes.extend_from_slice(&entry);
    }
    bytes
}

pub fn tiff_bytes(width: u32, height: u16) -> Vec<u8> {
    let mut bytes = b"II\x2A\0".to_vec();
    bytes.extend_from_slice(&8u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());

    bytes.extend_from_slice(&256u16.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&width.to_le_bytes());

    bytes.extend_from_slice(&257u16.to_le_bytes());
    bytes.extend_from_slice(&3u16.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

/// Little-endian TIFF block whose IFD0 holds only an orientation tag.
pub fn exif_tiff(orientation: u16) -> Vec<u8> {
    let mut bytes = b"II\x2A\0".to_vec();
    bytes.extend_from_slice(&8u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&0x0112u16.to_le_bytes());
    bytes.extend_from_slice(&3u16.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&orientation.to_le_bytes());
    bytes.extend_from_slice(&[0, 0]);
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes
}

fn jpeg_segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0xFF, marker];
    bytes.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

/// SOI, an optional APP1 Exif segment, then a baseline frame header.
pub fn jpeg_bytes(width: u16, height: u16, orientation: Option<u16>) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    if let Some(orientation) = orientation {
        let mut app1 = b"Exif\0\0".to_vec();
        app1.extend(exif_tiff(orientation));
        bytes.extend(jpeg_segment(0xE1, &app1));
    }
    let mut sof = vec![8];
    sof.extend_from_slice(&height.to_be_bytes());
    sof.extend_from_slice(&width.to_be_bytes());
    sof.extend_from_slice(&[1, 1, 0x11, 0]);
    bytes.extend(jpeg_segment(0xC0, &sof));
    bytes
}

pub fn riff_webp(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut body = b"WEBP".to_vec();
    for (kind, payload) in chunks {
        body.extend_from_slice(*kind);
        body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        body.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            body.push(0);
        }
    }
    let mut bytes = b"RIFF".to_vec();
    bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    bytes.extend(body);
    bytes
}

pub fn vp8x_payload(width: u32, height: u32, flags: u8) -> Vec<u8> {
    let mut payload = vec![flags, 0, 0, 0];
    payload.extend_from_slice(&(width - 1).to_le_bytes()[..3]);
    payload.extend_from_slice(&(height - 1).to_le_bytes()[..3]);
    payload
}

pub fn webp_vp8x_bytes(width: u32, height: u32) -> Vec<u8> {
    riff_webp(&[(b"VP8X", vp8x_payload(width, height, 0))])
}

pub fn webp_vp8_bytes(width: u16, height: u16) -> Vec<u8> {
    let mut payload = vec![0x50, 0x01, 0x00, 0x9D, 0x01, 0x2A];
    payload.extend_from_slice(&width.to_le_bytes());
    payload.extend_from_slice(&height.to_le_bytes());
    payload.extend_from_slice(&[0; 32]);
    riff_webp(&[(b"VP8 ", payload)])
}

pub fn svg_bytes(attributes: &str) -> Vec<u8> {
    format!(r#"<svg xmlns="http://www.w3.org/2000/svg" {attributes}><rect/></svg>"#).into_bytes()
}

pub fn iso_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut bytes = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    bytes.extend_from_slice(kind);
    bytes.extend_from_slice(payload);
    bytes
}

fn full_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut payload = vec![0, 0, 0, 0];
    payload.extend_from_slice(body);
    iso_box(kind, &payload)
}

pub fn avif_ftyp() -> Vec<u8> {
    iso_box(b"ftyp", b"avif\0\0\0\0mif1miaf")
}

/// `meta` box carrying a single spatial extent and an optional rotation.
pub fn avif_meta(width: u32, height: u32, rotation: Option<u8>) -> Vec<u8> {
    meta_box(width, height, rotation, None)
}

/// `meta` box as above, plus an `Exif` item (id 2) stored at `(offset, length)`.
fn meta_box(width: u32, height: u32, rotation: Option<u8>, exif: Option<(u32, u32)>) -> Vec<u8> {
    let mut ispe = width.to_be_bytes().to_vec();
    ispe.extend_from_slice(&height.to_be_bytes());
    let mut ipco = full_box(b"ispe", &ispe);
    if let Some(angle) = rotation {
        ipco.extend(iso_box(b"irot", &[angle]));
    }
    let iprp = iso_box(b"iprp", &iso_box(b"ipco", &ipco));

    let mut meta = vec![0, 0, 0, 0];
    let mut hdlr = vec![0, 0, 0, 0];
    hdlr.extend_from_slice(b"pict");
    hdlr.extend_from_slice(&[0; 13]);
    meta.extend(full_box(b"hdlr", &hdlr));

    if let Some((offset, length)) = exif {
        let mut infe = vec![2, 0, 0, 0];
        infe.extend_from_slice(&2u16.to_be_bytes());
        infe.extend_from_slice(&0u16.to_be_bytes());
        infe.extend_from_slice(b"Exif");
        let mut iinf = 1u16.to_be_bytes().to_vec();
        iinf.extend(iso_box(b"infe", &infe));
        meta.extend(full_box(b"iinf", &iinf));

        // 4-byte extent offset and length, no base offset
        let mut iloc = vec![0x44, 0x00];
        iloc.extend_from_slice(&1u16.to_be_bytes());
        iloc.extend_from_slice(&2u16.to_be_bytes());
        iloc.extend_from_slice(&0u16.to_be_bytes());
        iloc.extend_from_slice(&1u16.to_be_bytes());
        iloc.extend_from_slice(&offset.to_be_bytes());
        iloc.extend_from_slice(&length.to_be_bytes());
        meta.extend(full_box(b"iloc", &iloc));
    }

    meta.extend(iprp);
    iso_box(b"meta", &meta)
}

/// Exif item body: the offset to the TIFF header, `gap` filler bytes, then the TIFF block.
pub fn avif_exif_item(gap: usize, orientation: u16) -> Vec<u8> {
    let mut item = (gap as u32).to_be_bytes().to_vec();
    item.extend(std::iter::repeat_n(0xAA, gap));
    item.extend(exif_tiff(orientation));
    item
}

/// AVIF whose Exif item sits in an `mdat` after `meta`, or in a `free` box
/// ahead of it when `item_before_meta` is set.
pub fn avif_with_exif(
    width: u32,
    height: u32,
    rotation: Option<u8>,
    item: &[u8],
    item_before_meta: bool,
) -> Vec<u8> {
    let ftyp = avif_ftyp();
    let meta_len = meta_box(width, height, rotation, Some((0, 0))).len();
    let offset = if item_before_meta {
        ftyp.len() + 8
    } else {
        ftyp.len() + meta_len + 8
    };
    let meta = meta_box(width, height, rotation, Some((offset as u32, item.len() as u32)));

    let mut bytes = ftyp;
    if item_before_meta {
        bytes.extend(iso_box(b"free", item));
        bytes.extend(meta);
    } else {
        bytes.extend(meta);
        bytes.extend(iso_box(b"mdat", item));
    }
    bytes
}

pub fn avif_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = avif_ftyp();
    bytes.extend(avif_meta(width, height, None));
    bytes
}

/// Minimal valid header for every format, with the dimensions it encodes.
pub fn canonical_headers() -> Vec<(ImageFormat, Vec<u8>, (f64, f64))> {
    vec![
        (ImageFormat::Avif, avif_bytes(1024, 768), (1024.0, 768.0)),
        (ImageFormat::Bmp, bmp_bytes(800, 600), (800.0, 600.0)),
        (ImageFormat::Gif, gif_bytes(320, 240), (320.0, 240.0)),
        (ImageFormat::Ico, ico_bytes(&[(16, 16), (32, 32)]), (32.0, 32.0)),
        (ImageFormat::Jpeg, jpeg_bytes(1920, 1080, None), (1920.0, 1080.0)),
        (ImageFormat::Png, png_bytes(640, 480), (640.0, 480.0)),
        (ImageFormat::Psd, psd_bytes(300, 200), (300.0, 200.0)),
        (ImageFormat::Svg, b"<svg width=\"100\" height=\"50\">".to_vec(), (100.0, 50.0)),
        (ImageFormat::Tiff, tiff_bytes(1024, 768), (1024.0, 768.0)),
        (ImageFormat::Webp, webp_vp8x_bytes(100, 50), (100.0, 50.0)),
    ]
}

/// Runs one streaming decoder over `data`, delivered `chunk_size` bytes at a time.
pub async fn decode_chunked(
    format: ImageFormat,
    data: &[u8],
    chunk_size: usize,
) -> Option<SizeResult> {
    let (feed, mut input) = ByteDemand::channel(4);
    let chunks: Vec<Bytes> = data
        .chunks(chunk_size.max(1))
        .map(Bytes::copy_from_slice)
        .collect();

    let feeder = tokio::spawn(async move {
        for chunk in chunks {
            if feed.send(chunk).await.is_err() {
                break;
            }
        }
    });

    let outcome = format.decode(&mut input).await;
    input.skip_rest();
    feeder.await.expect("feeder task");
    outcome.ok().flatten()
}

/// Async source that hands out at most `chunk_size` bytes per read and counts
/// what has been pulled from it.
pub struct ChunkedReader {
    data: Vec<u8>,
    pos: usize,
    chunk_size: usize,
    pulled: Arc<AtomicUsize>,
    fail_at_end: bool,
}

impl ChunkedReader {
    pub fn new(data: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            data,
            pos: 0,
            chunk_size: chunk_size.max(1),
            pulled: Arc::new(AtomicUsize::new(0)),
            fail_at_end: false,
        }
    }

    /// Reports an I/O error instead of end-of-file once the data runs out.
    pub fn failing(mut self) -> Self {
        self.fail_at_end = true;
        self
    }

    pub fn pulled(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pulled)
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.pos >= self.data.len() && self.fail_at_end {
            let reset = io::Error::new(io::ErrorKind::ConnectionReset, "connection reset");
            return Poll::Ready(Err(reset));
        }

        let start = self.pos;
        let end = (start + self.chunk_size).min(self.data.len());
        let count = (end - start).min(buf.remaining());
        buf.put_slice(&self.data[start..start + count]);
        self.pos += count;
        self.pulled.fetch_add(count, Ordering::SeqCst);
        Poll::Ready(Ok(()))
    }
}
