//! Fixed convolution kernels driving the height field.
//!
//! Both kernels are odd-length and symmetric, so convolution and correlation
//! give the same result. The convolution is "same" mode: the output has the
//! length of the input, centred on it, and taps that fall outside the signal
//! read zero.

/// Discrete restoring term applied to the heights to accelerate the surface.
/// Sums to -0.1, pulling the surface back towards rest.
pub const VELOCITY_KERNEL: [f32; 5] = [0.05, 0.3, -0.8, 0.3, 0.05];

/// Low-pass smoothing applied to the heights every tick. Sums to 1.
pub const POSITION_KERNEL: [f32; 3] = [0.05, 0.9, 0.05];

/// Convolve `signal` with `kernel`, returning a buffer of the same length.
pub fn convolve_same(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0; signal.len()];
    convolve_same_into(signal, kernel, 1.0, &mut out);
    out
}

/// Convolve `signal` with `kernel * scale` into `out`.
///
/// `out` must have the same length as `signal`. Runs in O(n·k).
pub fn convolve_same_into(signal: &[f32], kernel: &[f32], scale: f32, out: &mut [f32]) {
    debug_assert_eq!(signal.len(), out.len());

    let n = signal.len() as isize;
    let k = kernel.len();
    if k == 0 {
        out.fill(0.0);
        return;
    }
    // Offset that centres the full convolution on the input (NumPy "same").
    let half = ((k - 1) / 2) as isize;

    for (i, slot) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for (j, &tap) in kernel.iter().enumerate() {
            let src = i as isize + half - j as isize;
            if src >= 0 && src < n {
                acc += tap * signal[src as usize];
            }
        }
        *slot = acc * scale;
    }
}
