mod resource;
pub mod validate;

pub use resource::{acquire_input, InputPayload};
pub use validate::{validate, SymbolDescriptor, SymbolSpec};

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    codec::{Codec, CodecFault, EncodeParams, JabCodec},
    common::{
        error::{EncodeError, EncodeResult, Warning},
        metadata::{ColorSpace, EccLevel},
        options::EncodeOptions,
    },
};
use resource::EncodeContext;

// Encode report
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeReport {
    pub output: PathBuf,
    pub color_space: ColorSpace,
    pub symbol_number: usize,
    pub warnings: Vec<Warning>,
}

// Encode
//------------------------------------------------------------------------------

/// Encodes the file at `source` into a code image at `image` with the built-in codec.
///
/// With `clear_source` set the source file is removed once the image is saved; failing
/// to remove it only adds a [`Warning`] to the report.
///
/// ```rust,no_run
/// use jabism::{encode, EncodeOptions};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut opts = EncodeOptions::new();
/// opts.color_number(8).module_size(6);
/// let report = encode("message.txt", "message.png", &opts, false)?;
/// println!("Wrote {} symbol(s) to {}", report.symbol_number, report.output.display());
/// # Ok(())
/// # }
/// ```
pub fn encode(
    source: impl AsRef<Path>,
    image: impl AsRef<Path>,
    options: &EncodeOptions,
    clear_source: bool,
) -> EncodeResult<EncodeReport> {
    encode_with(&JabCodec, source, image, options, clear_source)
}

pub fn encode_with<C: Codec + ?Sized>(
    codec: &C,
    source: impl AsRef<Path>,
    image: impl AsRef<Path>,
    options: &EncodeOptions,
    clear_source: bool,
) -> EncodeResult<EncodeReport> {
    let (source, image) = (source.as_ref(), image.as_ref());
    info!("Encoding {} into {}", source.display(), image.display());

    let mut ctx = EncodeContext::new();
    let res = run_encode(codec, &mut ctx, source, image, options);
    ctx.release();
    debug_assert!(ctx.is_released());
    let mut report = res?;

    if clear_source {
        match fs::remove_file(source) {
            Ok(()) => debug!("Removed source {}", source.display()),
            Err(e) => {
                let warning =
                    Warning::SourceNotRemoved { path: source.to_path_buf(), reason: e.to_string() };
                warn!("{warning}");
                report.warnings.push(warning);
            }
        }
    }

    info!("Encoded {} symbol(s) as {}", report.symbol_number, report.color_space);
    Ok(report)
}

fn run_encode<C: Codec + ?Sized>(
    codec: &C,
    ctx: &mut EncodeContext,
    source: &Path,
    image: &Path,
    options: &EncodeOptions,
) -> EncodeResult<EncodeReport> {
    // Options are checked before the source is touched
    let desc = ctx.descriptor.insert(validate(options)?);

    debug!("Reading source...");
    let payload = ctx.payload.insert(acquire_input(source)?);

    let color_number = desc.color_number.count() as u8;
    let symbol_number = desc.symbol_number() as u8;
    let params = codec
        .create_encode(color_number, symbol_number)
        .map_err(|reason| EncodeError::ParamInit { color_number, symbol_number, reason })?;
    let params = ctx.params.insert(params);

    overlay_scalars(desc, params);
    copy_symbols(desc, params);

    debug!("Generating code...");
    codec.generate(params, payload.data()).map_err(EncodeError::Generate)?;
    let bitmap =
        params.bitmap.as_ref().ok_or(EncodeError::Generate(CodecFault::MissingBitmap))?;

    debug!("Saving {} raster...", desc.color_space);
    let saved = match desc.color_space {
        ColorSpace::Rgb => codec.save_image(bitmap, image),
        ColorSpace::Cmyk => codec.save_image_cmyk(bitmap, image),
    };
    saved.map_err(|reason| EncodeError::Save {
        format: desc.color_space,
        path: image.to_path_buf(),
        reason,
    })?;

    Ok(EncodeReport {
        output: image.to_path_buf(),
        color_space: desc.color_space,
        symbol_number: desc.symbol_number(),
        warnings: Vec::new(),
    })
}

// Unset scalars keep the codec defaults
fn overlay_scalars(desc: &SymbolDescriptor, params: &mut EncodeParams) {
    if let Some(ms) = desc.module_size {
        params.module_size = ms;
    }
    if let Some(w) = desc.symbol_width {
        params.master_symbol_width = w;
    }
    if let Some(h) = desc.symbol_height {
        params.master_symbol_height = h;
    }
}

fn copy_symbols(desc: &SymbolDescriptor, params: &mut EncodeParams) {
    let n = desc.symbol_number();
    params.symbol_ecc_levels.resize(n, EccLevel::default());
    params.symbol_versions.resize(n, None);

    for (i, sym) in desc.symbols.iter().enumerate() {
        if let Some(level) = sym.ecc_level {
            params.symbol_ecc_levels[i] = level;
        }
        if sym.version.is_some() {
            params.symbol_versions[i] = sym.version;
        }
    }
    if desc.is_multi_symbol() {
        params.symbol_positions = desc.symbols.iter().filter_map(|s| s.position).collect();
    }
}

#[cfg(test)]
mod encode_tests {
    use std::{cell::RefCell, fs, path::Path};

    use image::{Rgb, RgbImage};

    use super::{encode, encode_with, resource::release_count};
    use crate::{
        codec::{Codec, CodecFault, CodecResult, DecodeMode, Decoded, EncodeParams, JabCodec},
        common::{
            error::{EncodeError, Warning},
            metadata::{ColorNumber, ColorSpace, EccLevel, SideVersion, SymbolPosition},
            options::EncodeOptions,
        },
        reader::decode,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum FailAt {
        Nothing,
        ParamInit,
        Generate,
        Save,
    }

    // Records the parameters it was handed, fails at the chosen stage
    struct MockCodec {
        fail_at: FailAt,
        seen: RefCell<Option<EncodeParams>>,
    }

    impl MockCodec {
        fn new(fail_at: FailAt) -> Self {
            Self { fail_at, seen: RefCell::new(None) }
        }
    }

    impl Codec for MockCodec {
        fn create_encode(&self, color_number: u8, symbol_number: u8) -> CodecResult<EncodeParams> {
            if self.fail_at == FailAt::ParamInit {
                return Err(CodecFault::UnsupportedSymbolNumber(symbol_number));
            }
            JabCodec.create_encode(color_number, symbol_number)
        }

        fn generate(&self, params: &mut EncodeParams, data: &[u8]) -> CodecResult<()> {
            *self.seen.borrow_mut() = Some(params.clone());
            if self.fail_at == FailAt::Generate || data.is_empty() {
                return Err(CodecFault::EmptyData);
            }
            params.bitmap = Some(RgbImage::from_pixel(4, 4, Rgb([255, 255, 255])));
            Ok(())
        }

        fn save_image(&self, bitmap: &RgbImage, path: &Path) -> CodecResult<()> {
            if self.fail_at == FailAt::Save {
                return Err(CodecFault::Io(std::io::Error::other("disk full")));
            }
            JabCodec.save_image(bitmap, path)
        }

        fn save_image_cmyk(&self, bitmap: &RgbImage, path: &Path) -> CodecResult<()> {
            if self.fail_at == FailAt::Save {
                return Err(CodecFault::Io(std::io::Error::other("disk full")));
            }
            JabCodec.save_image_cmyk(bitmap, path)
        }

        fn read_image(&self, path: &Path) -> CodecResult<RgbImage> {
            JabCodec.read_image(path)
        }

        fn decode(&self, _: &RgbImage, _: DecodeMode, _: usize) -> CodecResult<Decoded> {
            Err(CodecFault::NotFound)
        }
    }

    fn source_file(dir: &Path, data: &[u8]) -> std::path::PathBuf {
        let path = dir.join("source.bin");
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_hello_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_file(dir.path(), b"hello");
        let img = dir.path().join("hello.png");

        let mut opts = EncodeOptions::new();
        opts.color_number(8).symbol_number(1).module_size(4);
        let report = encode(&src, &img, &opts, false).unwrap();
        assert_eq!(report.output, img);
        assert_eq!(report.color_space, ColorSpace::Rgb);
        assert_eq!(report.symbol_number, 1);
        assert!(report.warnings.is_empty());
        assert!(img.exists());
        assert!(src.exists());

        let out = decode(&img).unwrap();
        assert_eq!(out.data, b"hello");
        assert_eq!(out.text(), "hello");
    }

    #[test]
    fn test_invalid_color_number_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("never-created.bin");
        let img = dir.path().join("out.png");

        let mut opts = EncodeOptions::new();
        opts.color_number(5);
        let before = release_count();
        let err = encode(&missing, &img, &opts, false).unwrap_err();
        assert!(matches!(err, EncodeError::Config(_)), "Unexpected error {err}");
        assert!(err.to_string().contains("invalid color number"));
        assert_eq!(release_count() - before, 1);
        assert!(!img.exists());
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let before = release_count();
        let opts = EncodeOptions::new();
        let err = encode(dir.path().join("absent"), dir.path().join("out.png"), &opts, false)
            .unwrap_err();
        assert!(matches!(err, EncodeError::Input(_)));
        assert_eq!(release_count() - before, 1);
    }

    #[test]
    fn test_empty_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_file(dir.path(), b"");
        let img = dir.path().join("out.png");
        let err = encode(&src, &img, &EncodeOptions::new(), true).unwrap_err();
        assert!(matches!(err, EncodeError::Generate(CodecFault::EmptyData)));
        assert!(!img.exists());
        assert!(src.exists(), "Source must survive a failed encode");
    }

    #[test]
    fn test_oversized_canvas_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_file(dir.path(), b"hello");
        let img = dir.path().join("huge.png");

        let mut by_module = EncodeOptions::new();
        by_module.module_size(i32::MAX);
        let mut by_width = EncodeOptions::new();
        by_width.symbol_width(i32::MAX);

        for opts in [by_module, by_width] {
            let before = release_count();
            let err = encode(&src, &img, &opts, false).unwrap_err();
            assert!(
                matches!(err, EncodeError::Generate(CodecFault::CanvasTooLarge { .. })),
                "Unexpected error {err}"
            );
            assert_eq!(release_count() - before, 1);
            assert!(!img.exists());
        }
    }

    #[test]
    fn test_failure_stages_release_once() {
        let cases = [
            (FailAt::ParamInit, "cannot create encode parameters"),
            (FailAt::Generate, "creating code failed"),
            (FailAt::Save, "saving RGB/PNG image"),
        ];
        for (fail_at, msg) in cases {
            let dir = tempfile::tempdir().unwrap();
            let src = source_file(dir.path(), b"data");
            let codec = MockCodec::new(fail_at);

            let before = release_count();
            let img = dir.path().join("out.png");
            let err = encode_with(&codec, &src, img, &EncodeOptions::new(), true).unwrap_err();
            assert!(err.to_string().contains(msg), "Stage {fail_at:?}: {err}");
            assert_eq!(release_count() - before, 1, "Stage {fail_at:?}");
            assert!(src.exists());
        }
    }

    #[test]
    fn test_save_error_names_cmyk() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_file(dir.path(), b"data");
        let mut opts = EncodeOptions::new();
        opts.color_space(1);
        let codec = MockCodec::new(FailAt::Save);
        let err = encode_with(&codec, &src, dir.path().join("o.tif"), &opts, false).unwrap_err();
        assert!(matches!(err, EncodeError::Save { format: ColorSpace::Cmyk, .. }));
        assert!(err.to_string().contains("CMYK/TIFF"));
    }

    #[test]
    fn test_parameters_overlaid() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_file(dir.path(), b"data");
        let codec = MockCodec::new(FailAt::Nothing);

        let mut opts = EncodeOptions::new();
        opts.color_number(4)
            .module_size(0)
            .symbol_width(300)
            .symbol_number(3)
            .ecc_levels(&[6, 0])
            .symbol_positions(&[0, 3, 4])
            .symbol_versions(&[(2, 2), (5, 2), (2, 7)]);
        encode_with(&codec, &src, dir.path().join("out.png"), &opts, false).unwrap();

        let seen = codec.seen.borrow().clone().unwrap();
        assert_eq!(seen.color_number, ColorNumber::Four);
        assert_eq!(seen.symbol_number, 3);
        assert_eq!(seen.module_size, 12, "Unset module size keeps the codec default");
        assert_eq!(seen.master_symbol_width, 300);
        assert_eq!(seen.master_symbol_height, 0);
        assert_eq!(seen.symbol_ecc_levels, [6, 0, 0].map(EccLevel::new).to_vec());
        let versions = [(2, 2), (5, 2), (2, 7)].map(|(x, y)| Some(SideVersion::new(x, y)));
        assert_eq!(seen.symbol_versions, versions.to_vec());
        assert_eq!(seen.symbol_positions, [0, 3, 4].map(SymbolPosition::new).to_vec());
    }

    #[test]
    fn test_clear_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = source_file(dir.path(), b"remove me");
        let img = dir.path().join("out.png");
        let codec = MockCodec::new(FailAt::Nothing);
        let report = encode_with(&codec, &src, &img, &EncodeOptions::new(), true).unwrap();
        assert!(!src.exists());
        assert!(img.exists());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_clear_source_failure_warns() {
        let dir = tempfile::tempdir().unwrap();
        // The codec removes the source mid-call, so the clear step finds nothing
        let src = source_file(dir.path(), b"vanishing");
        let img = dir.path().join("out.png");

        struct Vanishing<'a>(&'a Path);
        impl Codec for Vanishing<'_> {
            fn create_encode(&self, c: u8, s: u8) -> CodecResult<EncodeParams> {
                JabCodec.create_encode(c, s)
            }
            fn generate(&self, params: &mut EncodeParams, data: &[u8]) -> CodecResult<()> {
                fs::remove_file(self.0)?;
                JabCodec.generate(params, data)
            }
            fn save_image(&self, bitmap: &RgbImage, path: &Path) -> CodecResult<()> {
                JabCodec.save_image(bitmap, path)
            }
            fn save_image_cmyk(&self, bitmap: &RgbImage, path: &Path) -> CodecResult<()> {
                JabCodec.save_image_cmyk(bitmap, path)
            }
            fn read_image(&self, path: &Path) -> CodecResult<RgbImage> {
                JabCodec.read_image(path)
            }
            fn decode(&self, img: &RgbImage, mode: DecodeMode, max: usize) -> CodecResult<Decoded> {
                JabCodec.decode(img, mode, max)
            }
        }

        let mut opts = EncodeOptions::new();
        opts.module_size(1);
        let report = encode_with(&Vanishing(&src), &src, &img, &opts, true).unwrap();
        assert!(img.exists());
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(&report.warnings[0], Warning::SourceNotRemoved { path, .. } if path == &src));
    }
}
