//! Recognition of binned product files by name.

/// Whether `name` looks like a binned Level-3 product.
///
/// The name must end in `.l3b` (any case), and either one of the
/// dot-separated parts before the extension starts with `L3`
/// (`A2010001.L3b_DAY_CHL.l3b`) or the name carries a `-bins` suffix
/// marker (`modis-aqua-bins.l3b`).
pub fn is_binned_product_name(name: &str) -> bool {
    // Only the final path component counts
    let file_name = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let lower = file_name.to_ascii_lowercase();

    let Some(stem) = lower.strip_suffix(".l3b") else {
        return false;
    };

    stem.split('.').any(|part| part.starts_with("l3")) || stem.contains("-bins")
}
