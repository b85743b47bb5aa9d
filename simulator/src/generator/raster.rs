use ndarray::Array2;

/// Fills a disk of `radius` pixels around `(cx, cy)`, clipped to the image.
pub fn paint_disk(pixels: &mut Array2<u8>, cx: f32, cy: f32, radius: f32, value: u8) {
    let (height, width) = pixels.dim();
    if radius <= 0.0 || width == 0 || height == 0 {
        return;
    }
    let x_min = (cx - radius).floor().max(0.0) as usize;
    let y_min = (cy - radius).floor().max(0.0) as usize;
    let x_max = ((cx + radius).ceil().max(0.0) as usize).min(width - 1);
    let y_max = ((cy + radius).ceil().max(0.0) as usize).min(height - 1);
    let r2 = radius * radius;

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= r2 {
                pixels[[y, x]] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_is_clipped_to_image() {
        let mut pixels = Array2::zeros((10, 10));
        paint_disk(&mut pixels, 0.0, 0.0, 3.0, 7);
        assert_eq!(pixels[[0, 0]], 7);
        assert_eq!(pixels[[3, 0]], 7);
        assert_eq!(pixels[[3, 3]], 0);
        assert_eq!(pixels[[9, 9]], 0);
    }

    #[test]
    fn disk_outside_image_paints_nothing() {
        let mut pixels = Array2::zeros((4, 4));
        paint_disk(&mut pixels, 50.0, 50.0, 2.0, 9);
        assert!(pixels.iter().all(|&v| v == 0));
    }
}
