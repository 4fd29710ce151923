use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// The closed set of architectures a config may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelKind {
    SUNet18,
    ResNet18,
    ChangeFormer,
    SiamUnetConc,
    Unet,
    MtbitResnet18,
    MtbitResnet50,
}

impl ModelKind {
    pub const ALL: [ModelKind; 7] = [
        ModelKind::SUNet18,
        ModelKind::ResNet18,
        ModelKind::ChangeFormer,
        ModelKind::SiamUnetConc,
        ModelKind::Unet,
        ModelKind::MtbitResnet18,
        ModelKind::MtbitResnet50,
    ];

    /// The name used in experiment configs.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::SUNet18 => "SUNet18",
            ModelKind::ResNet18 => "ResNet18",
            ModelKind::ChangeFormer => "ChangeFormer",
            ModelKind::SiamUnetConc => "SiamUnet_conc",
            ModelKind::Unet => "Unet",
            ModelKind::MtbitResnet18 => "mtbit_resnet18",
            ModelKind::MtbitResnet50 => "mtbit_resnet50",
        }
    }

    /// Architectural hyperparameters fixed for each kind.
    pub fn arch_spec(&self) -> ArchSpec {
        let base = ArchSpec {
            kind: *self,
            input_nc: 3,
            output_nc: 2,
            share_encoder: false,
            decoder_softmax: false,
            embed_dim: 64,
            backbone: Backbone::ResNet18,
            tokenizer: None,
        };
        match self {
            ModelKind::SUNet18 | ModelKind::ResNet18 => base,
            ModelKind::ChangeFormer => ArchSpec { embed_dim: 32, ..base },
            ModelKind::SiamUnetConc | ModelKind::Unet => ArchSpec { embed_dim: 16, ..base },
            ModelKind::MtbitResnet18 => ArchSpec {
                embed_dim: 32,
                tokenizer: Some(TokenizerSpec {
                    token_len: 4,
                    resnet_stages_num: 4,
                    if_upsample_2x: false,
                    learned_pos: true,
                    enc_depth: 1,
                    dec_depth: 8,
                    decoder_dim_head: 8,
                }),
                ..base
            },
            ModelKind::MtbitResnet50 => ArchSpec {
                backbone: Backbone::ResNet50,
                tokenizer: Some(TokenizerSpec {
                    token_len: 4,
                    resnet_stages_num: 4,
                    if_upsample_2x: true,
                    learned_pos: true,
                    enc_depth: 1,
                    dec_depth: 8,
                    decoder_dim_head: 16,
                }),
                ..base
            },
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::UnknownModel(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Backbone {
    ResNet18,
    ResNet50,
}

/// Bitemporal-transformer settings of the MTBIT variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenizerSpec {
    pub token_len: usize,
    pub resnet_stages_num: usize,
    pub if_upsample_2x: bool,
    pub learned_pos: bool,
    pub enc_depth: usize,
    pub dec_depth: usize,
    pub decoder_dim_head: usize,
}

/// Construction parameters handed to a model constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchSpec {
    pub kind: ModelKind,
    /// Channels per input image.
    pub input_nc: usize,
    /// Classes predicted by the 2-D head.
    pub output_nc: usize,
    pub share_encoder: bool,
    pub decoder_softmax: bool,
    /// Feature width of the encoder.
    pub embed_dim: usize,
    pub backbone: Backbone,
    pub tokenizer: Option<TokenizerSpec>,
}

impl ArchSpec {
    pub fn with_classes(self, output_nc: usize) -> ArchSpec {
        ArchSpec { output_nc, ..self }
    }
}
