use serde::{Deserialize, Serialize};

/// Board layer classification, derived from the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    TopCopper,
    BottomCopper,
    TopPaste,
    BottomPaste,
    TopSolderMask,
    BottomSolderMask,
    TopSilkscreen,
    BottomSilkscreen,
    Fabrication,
    BoardOutline,
    Unknown,
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerKind::TopCopper => write!(f, "Top Copper"),
            LayerKind::BottomCopper => write!(f, "Bottom Copper"),
            LayerKind::TopPaste => write!(f, "Top Paste"),
            LayerKind::BottomPaste => write!(f, "Bottom Paste"),
            LayerKind::TopSolderMask => write!(f, "Top Solder Mask"),
            LayerKind::BottomSolderMask => write!(f, "Bottom Solder Mask"),
            LayerKind::TopSilkscreen => write!(f, "Top Silkscreen"),
            LayerKind::BottomSilkscreen => write!(f, "Bottom Silkscreen"),
            LayerKind::Fabrication => write!(f, "Fabrication"),
            LayerKind::BoardOutline => write!(f, "Board Outline"),
            LayerKind::Unknown => write!(f, "Unknown"),
        }
    }
}

impl LayerKind {
    /// Classify a layer from its file name (Protel extensions and KiCad names).
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        let ext = lower.rsplit_once('.').map(|(_, e)| e).unwrap_or("");

        match ext {
            "gtl" => return LayerKind::TopCopper,
            "gbl" => return LayerKind::BottomCopper,
            "gtp" => return LayerKind::TopPaste,
            "gbp" => return LayerKind::BottomPaste,
            "gts" => return LayerKind::TopSolderMask,
            "gbs" => return LayerKind::BottomSolderMask,
            "gto" => return LayerKind::TopSilkscreen,
            "gbo" => return LayerKind::BottomSilkscreen,
            "gko" | "gm1" => return LayerKind::BoardOutline,
            _ => {}
        }

        let bottom = lower.starts_with("b_")
            || lower.starts_with("b.")
            || ["-b_", "_b_", "-b.", "bottom"].iter().any(|m| lower.contains(m));
        if lower.contains("edge.cuts") || lower.contains("edge_cuts") || lower.contains("outline") {
            LayerKind::BoardOutline
        } else if lower.contains("paste") {
            if bottom {
                LayerKind::BottomPaste
            } else {
                LayerKind::TopPaste
            }
        } else if lower.contains("mask") {
            if bottom {
                LayerKind::BottomSolderMask
            } else {
                LayerKind::TopSolderMask
            }
        } else if lower.contains("silk") {
            if bottom {
                LayerKind::BottomSilkscreen
            } else {
                LayerKind::TopSilkscreen
            }
        } else if lower.contains("fab") || lower.contains("assembly") || lower.contains("fid") {
            LayerKind::Fabrication
        } else if lower.contains("cu") || lower.contains("copper") {
            if bottom {
                LayerKind::BottomCopper
            } else {
                LayerKind::TopCopper
            }
        } else {
            LayerKind::Unknown
        }
    }

    /// Layers whose flashes are dispensing targets
    pub fn is_paste(&self) -> bool {
        matches!(self, LayerKind::TopPaste | LayerKind::BottomPaste)
    }

    /// Layers whose flashes carry authoritative pad geometry
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            LayerKind::TopCopper
                | LayerKind::BottomCopper
                | LayerKind::TopSolderMask
                | LayerKind::BottomSolderMask
        )
    }
}
