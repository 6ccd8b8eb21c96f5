use std::collections::HashSet;

use num_traits::ToPrimitive;
use tracing::debug;

use crate::common::{
    error::{ConfigError, ConfigResult},
    metadata::{
        find_host, ColorNumber, ColorSpace, Dock, EccLevel, SideVersion, SymbolPosition,
        MAX_ECC_LEVEL, MAX_SIDE_VERSION, MAX_SYMBOL_NUMBER,
    },
    options::EncodeOptions,
};

// Symbol descriptor
//------------------------------------------------------------------------------

/// Per-symbol configuration after validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolSpec {
    pub ecc_level: Option<EccLevel>,
    pub version: Option<SideVersion>,
    pub position: Option<SymbolPosition>,
    // Index of the earlier symbol this one docks to, None for the master
    pub host: Option<usize>,
}

/// Validated and internally consistent configuration of an N-symbol code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDescriptor {
    pub color_number: ColorNumber,
    // None when left at 0, the codec default then applies
    pub module_size: Option<u32>,
    pub symbol_width: Option<u32>,
    pub symbol_height: Option<u32>,
    pub color_space: ColorSpace,
    pub symbols: Vec<SymbolSpec>,
}

impl SymbolDescriptor {
    pub fn symbol_number(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_multi_symbol(&self) -> bool {
        self.symbols.len() > 1
    }
}

// Validate
//------------------------------------------------------------------------------

/// Checks every field of `opts` and builds the symbol descriptor. The first violation
/// short-circuits: scalars first, then array elements, then cross-field layout rules.
pub fn validate(opts: &EncodeOptions) -> ConfigResult<SymbolDescriptor> {
    debug!("Validating options...");

    let color_number = opts
        .color_number
        .to_u8()
        .and_then(ColorNumber::from_count)
        .ok_or(ConfigError::InvalidColorNumber(opts.color_number))?;
    let module_size = non_negative(opts.module_size, ConfigError::InvalidModuleSize)?;
    let symbol_width = non_negative(opts.symbol_width, ConfigError::InvalidSymbolWidth)?;
    let symbol_height = non_negative(opts.symbol_height, ConfigError::InvalidSymbolHeight)?;
    let n = opts
        .symbol_number
        .to_usize()
        .filter(|n| (1..=MAX_SYMBOL_NUMBER).contains(n))
        .ok_or(ConfigError::InvalidSymbolNumber(opts.symbol_number))?;
    let color_space = opts
        .color_space
        .to_u8()
        .and_then(ColorSpace::from_code)
        .ok_or(ConfigError::InvalidColorSpace(opts.color_space))?;

    let ecc_levels = validate_ecc_levels(&opts.ecc_levels, n)?;
    let versions = validate_versions(&opts.symbol_versions, n)?;
    let positions = validate_positions(&opts.symbol_positions, n)?;

    let hosts = if n == 1 {
        if let Some(&pos) = positions.first() {
            if pos != SymbolPosition::MASTER {
                return Err(ConfigError::MasterPosition(*pos));
            }
        }
        vec![None]
    } else {
        if positions.len() != n {
            return Err(ConfigError::PositionsIncomplete { given: positions.len(), expected: n });
        }
        if versions.len() != n {
            return Err(ConfigError::VersionsIncomplete { given: versions.len(), expected: n });
        }
        validate_layout(&positions, &versions)?
    };

    let symbols = hosts
        .into_iter()
        .enumerate()
        .map(|(i, host)| SymbolSpec {
            ecc_level: ecc_levels.get(i).copied(),
            version: versions.get(i).copied(),
            position: positions.get(i).copied(),
            host,
        })
        .collect::<Vec<_>>();

    debug!("Options valid: {} color(s), {n} symbol(s), {color_space}", color_number.count());
    Ok(SymbolDescriptor {
        color_number,
        module_size,
        symbol_width,
        symbol_height,
        color_space,
        symbols,
    })
}

// Zero means unset, negatives are rejected
fn non_negative(value: i32, err: fn(i32) -> ConfigError) -> ConfigResult<Option<u32>> {
    match value.to_u32() {
        Some(0) => Ok(None),
        Some(v) => Ok(Some(v)),
        None => Err(err(value)),
    }
}

fn validate_ecc_levels(levels: &[i32], n: usize) -> ConfigResult<Vec<EccLevel>> {
    if levels.len() > n {
        return Err(ConfigError::TooManyEccLevels { given: levels.len(), symbols: n });
    }
    levels
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            value
                .to_u8()
                .filter(|&l| l <= MAX_ECC_LEVEL)
                .map(EccLevel::new)
                .ok_or(ConfigError::InvalidEccLevel { index, value })
        })
        .collect()
}

fn validate_versions(versions: &[(i32, i32)], n: usize) -> ConfigResult<Vec<SideVersion>> {
    if versions.len() > n {
        return Err(ConfigError::TooManyVersions { given: versions.len(), symbols: n });
    }
    let side = |v: i32| v.to_u8().filter(|v| (1..=MAX_SIDE_VERSION).contains(v));
    versions
        .iter()
        .enumerate()
        .map(|(index, &(x, y))| match (side(x), side(y)) {
            (Some(vx), Some(vy)) => Ok(SideVersion::new(vx, vy)),
            _ => Err(ConfigError::InvalidVersion { index, x, y }),
        })
        .collect()
}

fn validate_positions(positions: &[i32], n: usize) -> ConfigResult<Vec<SymbolPosition>> {
    if positions.len() > n {
        return Err(ConfigError::TooManyPositions { given: positions.len(), symbols: n });
    }
    positions
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            value
                .to_u8()
                .filter(|&p| (p as usize) < MAX_SYMBOL_NUMBER)
                .map(SymbolPosition::new)
                .ok_or(ConfigError::InvalidPosition { index, value })
        })
        .collect()
}

// Master at the root, distinct slots, every slave docked to an earlier symbol and
// touching sides of the same size. Returns each symbol's host.
fn validate_layout(
    positions: &[SymbolPosition],
    versions: &[SideVersion],
) -> ConfigResult<Vec<Option<usize>>> {
    if positions[0] != SymbolPosition::MASTER {
        return Err(ConfigError::MasterPosition(*positions[0]));
    }

    let mut seen = HashSet::with_capacity(positions.len());
    let mut hosts = Vec::with_capacity(positions.len());
    for (i, &pos) in positions.iter().enumerate() {
        if !seen.insert(pos) {
            return Err(ConfigError::DuplicatePosition { index: i, position: *pos });
        }
        if i == 0 {
            hosts.push(None);
            continue;
        }

        let host = find_host(positions, i)
            .ok_or(ConfigError::UndockedSymbol { index: i, position: *pos })?;
        for (j, &other) in positions[..i].iter().enumerate() {
            let shared = match pos.dock(other) {
                Some(Dock::Horizontal) => versions[i].y == versions[j].y,
                Some(Dock::Vertical) => versions[i].x == versions[j].x,
                None => true,
            };
            if !shared {
                return Err(ConfigError::MismatchedSideVersion { index: i, neighbour: j });
            }
        }
        hosts.push(Some(host));
    }
    Ok(hosts)
}


#[cfg(test)]
mod validate_proptests {
    use proptest::prelude::*;

    use super::validate;
    use crate::common::options::EncodeOptions;

    fn single_symbol_strategy() -> impl Strategy<Value = EncodeOptions> {
        (
            prop_oneof![Just(4), Just(8)],
            0..100i32,
            0..2000i32,
            0..2000i32,
            0..=1i32,
            proptest::option::of(0..=10i32),
            proptest::option::of((1..=32i32, 1..=32i32)),
            any::<bool>(),
        )
            .prop_map(|(clr, ms, w, h, cs, ecc, ver, root)| {
                let mut opts = EncodeOptions::new();
                opts.color_number(clr).module_size(ms).symbol_width(w).symbol_height(h);
                opts.color_space(cs);
                opts.ecc_levels(&ecc.into_iter().collect::<Vec<_>>());
                opts.symbol_versions(&ver.into_iter().collect::<Vec<_>>());
                if root {
                    opts.symbol_positions(&[0]);
                }
                opts
            })
    }

    proptest! {
        #[test]
        fn proptest_single_symbol_validates(opts in single_symbol_strategy()) {
            let desc = validate(&opts).unwrap();
            prop_assert_eq!(desc.symbol_number(), 1);
        }

        #[test]
        fn proptest_out_of_range_ecc(level in prop_oneof![i32::MIN..0, 11..i32::MAX]) {
            let mut opts = EncodeOptions::new();
            opts.ecc_levels(&[level]);
            prop_assert_eq!(validate(&opts).unwrap_err().field(), "eccLevels");
        }

        #[test]
        fn proptest_out_of_range_version(x in 1..=32i32, y in prop_oneof![i32::MIN..1, 33..i32::MAX]) {
            let mut opts = EncodeOptions::new();
            opts.symbol_versions(&[(x, y)]);
            prop_assert_eq!(validate(&opts).unwrap_err().field(), "symbolVersions");
        }

        #[test]
        fn proptest_out_of_range_position(pos in prop_oneof![i32::MIN..0, 61..i32::MAX]) {
            let mut opts = EncodeOptions::new();
            opts.symbol_number(2).symbol_positions(&[0, pos]).symbol_versions(&[(1, 1), (1, 1)]);
            prop_assert_eq!(validate(&opts).unwrap_err().field(), "symbolPositions");
        }

        #[test]
        fn proptest_partial_multi_symbol(n in 2..=61i32, given in 0usize..61) {
            let given = given % n as usize;
            let positions = (0..given as i32).collect::<Vec<_>>();
            let mut opts = EncodeOptions::new();
            opts.symbol_number(n).symbol_positions(&positions);
            prop_assert!(validate(&opts).is_err());
        }
    }
}
