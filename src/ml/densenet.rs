// ============================================================
// Layer 5 — DenseNet (CIFAR variant)
// ============================================================
// DenseNet-BC sized for 32x32 inputs (Huang et al., 2017):
//
//   stem       conv 3x3, 3 → 2k channels           32x32
//   block 1    n1 bottlenecks, +k channels each
//   transition bn-relu-conv1x1 (×reduction), avgpool 2   → 16x16
//   block 2    ...                                         → 8x8
//   block 3    ...                                         → 4x4
//   block 4    (no transition after the last block)
//   head       bn-relu, global average pool, linear
//
// Bottleneck: bn-relu-conv1x1 (→ 4k) → bn-relu-conv3x3 (→ k),
// output concatenated onto its input along the channel axis.
//
// The defaults (k = 12, blocks [6, 12, 24, 16]) are the usual
// "densenet_cifar" configuration.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, AvgPool2d, AvgPool2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::model::ImageClassifier;

#[derive(Config, Debug)]
pub struct DenseNetConfig {
    #[config(default = 10)]
    pub num_classes: usize,

    /// Channels added by every bottleneck (k)
    #[config(default = 12)]
    pub growth_rate: usize,

    /// Bottleneck count per dense block
    #[config(default = "vec![6, 12, 24, 16]")]
    pub block_layers: Vec<usize>,

    /// Channel compression applied by each transition
    #[config(default = 0.5)]
    pub reduction: f64,
}

impl DenseNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DenseNet<B> {
        let mut channels = 2 * self.growth_rate;
        let stem = conv3x3(3, channels, device);

        let mut blocks      = Vec::with_capacity(self.block_layers.len());
        let mut transitions = Vec::with_capacity(self.block_layers.len().saturating_sub(1));

        for (i, &layers) in self.block_layers.iter().enumerate() {
            let bottlenecks = (0..layers)
                .map(|j| self.build_bottleneck(channels + j * self.growth_rate, device))
                .collect();
            blocks.push(DenseBlock { bottlenecks });
            channels += layers * self.growth_rate;

            if i + 1 < self.block_layers.len() {
                let out = ((channels as f64) * self.reduction).floor() as usize;
                transitions.push(Transition {
                    norm: BatchNormConfig::new(channels).init(device),
                    conv: conv1x1(channels, out, device),
                    pool: AvgPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
                });
                channels = out;
            }
        }

        DenseNet {
            stem,
            blocks,
            transitions,
            norm: BatchNormConfig::new(channels).init(device),
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            head: LinearConfig::new(channels, self.num_classes).init(device),
        }
    }

    fn build_bottleneck<B: Backend>(&self, in_channels: usize, device: &B::Device) -> Bottleneck<B> {
        let inner = 4 * self.growth_rate;
        Bottleneck {
            norm1: BatchNormConfig::new(in_channels).init(device),
            conv1: conv1x1(in_channels, inner, device),
            norm2: BatchNormConfig::new(inner).init(device),
            conv2: conv3x3(inner, self.growth_rate, device),
        }
    }
}

fn conv1x1<B: Backend>(in_channels: usize, out_channels: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([in_channels, out_channels], [1, 1])
        .with_bias(false)
        .init(device)
}

fn conv3x3<B: Backend>(in_channels: usize, out_channels: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([in_channels, out_channels], [3, 3])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_bias(false)
        .init(device)
}

#[derive(Module, Debug)]
pub struct Bottleneck<B: Backend> {
    pub norm1: BatchNorm<B, 2>,
    pub conv1: Conv2d<B>,
    pub norm2: BatchNorm<B, 2>,
    pub conv2: Conv2d<B>,
}

impl<B: Backend> Bottleneck<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = self.conv1.forward(relu(self.norm1.forward(x.clone())));
        let out = self.conv2.forward(relu(self.norm2.forward(out)));
        Tensor::cat(vec![out, x], 1)
    }
}

#[derive(Module, Debug)]
pub struct DenseBlock<B: Backend> {
    pub bottlenecks: Vec<Bottleneck<B>>,
}

impl<B: Backend> DenseBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.bottlenecks.iter().fold(x, |x, layer| layer.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct Transition<B: Backend> {
    pub norm: BatchNorm<B, 2>,
    pub conv: Conv2d<B>,
    pub pool: AvgPool2d,
}

impl<B: Backend> Transition<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.pool.forward(self.conv.forward(relu(self.norm.forward(x))))
    }
}

#[derive(Module, Debug)]
pub struct DenseNet<B: Backend> {
    pub stem:        Conv2d<B>,
    pub blocks:      Vec<DenseBlock<B>>,
    pub transitions: Vec<Transition<B>>,
    pub norm:        BatchNorm<B, 2>,
    pub pool:        AdaptiveAvgPool2d,
    pub head:        Linear<B>,
}

impl<B: Backend> DenseNet<B> {
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = self.stem.forward(images);
        for (i, block) in self.blocks.iter().enumerate() {
            x = block.forward(x);
            if let Some(transition) = self.transitions.get(i) {
                x = transition.forward(x);
            }
        }
        let x = self.pool.forward(relu(self.norm.forward(x))); // [batch, c, 1, 1]
        self.head.forward(x.flatten::<2>(1, 3))
    }
}

impl<B: Backend> ImageClassifier<B> for DenseNet<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        DenseNet::forward(self, images)
    }
}
