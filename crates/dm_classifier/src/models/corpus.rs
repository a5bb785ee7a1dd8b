//! Labelled Vietnamese headlines the statistical classifier is trained on.
use dm_core::MlCategory;

pub const TRAINING_DATA: &[(&str, MlCategory)] = &[
    // flood
    ("Lũ quét kinh hoàng cuốn trôi nhiều nhà cửa tại Yên Bái", MlCategory::Flood),
    ("Nước lũ dâng cao gây ngập úng diện rộng tại đồng bằng sông Cửu Long", MlCategory::Flood),
    ("Mưa lớn gây ngập lụt nghiêm trọng tại TP.HCM", MlCategory::Flood),
    ("Triều cường kết hợp mưa lớn gây ngập nhiều tuyến đường", MlCategory::Flood),
    ("Vỡ đê khiến hàng nghìn hecta lúa bị ngập", MlCategory::Flood),
    ("Lũ ống bất ngờ ập xuống bản làng miền núi", MlCategory::Flood),
    ("Nước sông dâng cao vượt mức báo động 3", MlCategory::Flood),
    ("Hồ thủy điện xả lũ gây ngập vùng hạ du", MlCategory::Flood),
    ("Mực nước sông Hồng đang lên nhanh", MlCategory::Flood),
    ("Người dân di tản tránh lũ trong đêm", MlCategory::Flood),
    ("Lũ lớn nhấn chìm nhiều xã vùng trũng", MlCategory::Flood),
    ("Nước ngập sâu 2 mét tại khu dân cư", MlCategory::Flood),
    // storm
    ("Bão số 9 đổ bộ vào miền Trung với sức gió giật cấp 15", MlCategory::Storm),
    ("Siêu bão Yagi đang hướng vào biển Đông", MlCategory::Storm),
    ("Áp thấp nhiệt đới mạnh lên thành bão", MlCategory::Storm),
    ("Bão gây mưa to gió lớn tại các tỉnh ven biển", MlCategory::Storm),
    ("Gió bão quật đổ nhiều cây xanh và nhà cửa", MlCategory::Storm),
    ("Tâm bão đi qua các tỉnh Bình Định Phú Yên", MlCategory::Storm),
    ("Sức gió mạnh nhất vùng gần tâm bão cấp 13", MlCategory::Storm),
    ("Bão đổ bộ gây thiệt hại nặng nề", MlCategory::Storm),
    ("Các tỉnh khẩn trương ứng phó bão", MlCategory::Storm),
    ("Bão suy yếu thành áp thấp nhiệt đới", MlCategory::Storm),
    ("Mắt bão đang cách bờ biển 200km", MlCategory::Storm),
    ("Cảnh báo bão khẩn cấp cho ngư dân", MlCategory::Storm),
    // earthquake
    ("Động đất mạnh 5,8 độ richter tại Điện Biên", MlCategory::Earthquake),
    ("Rung chấn mạnh khiến người dân hoang mang", MlCategory::Earthquake),
    ("Dư chấn động đất còn tiếp diễn", MlCategory::Earthquake),
    ("Địa chấn gây nứt tường nhiều nhà dân", MlCategory::Earthquake),
    ("Trận động đất được ghi nhận tại vùng biên giới", MlCategory::Earthquake),
    ("Động đất làm rung chuyển nhiều tòa nhà cao tầng", MlCategory::Earthquake),
    ("Viện Vật lý địa cầu thông báo về trận động đất", MlCategory::Earthquake),
    ("Người dân tháo chạy khi cảm nhận động đất", MlCategory::Earthquake),
    ("Nhiều dư chấn nhỏ sau trận động đất chính", MlCategory::Earthquake),
    ("Động đất xảy ra ở độ sâu 10km", MlCategory::Earthquake),
    // landslide
    ("Sạt lở đất vùi lấp nhiều ngôi nhà tại Quảng Nam", MlCategory::Landslide),
    ("Mưa lớn gây sạt lở nghiêm trọng trên quốc lộ", MlCategory::Landslide),
    ("Đồi núi sạt lở chặn đường giao thông", MlCategory::Landslide),
    ("Sạt lở ta luy âm gây ách tắc giao thông", MlCategory::Landslide),
    ("Nhiều điểm sạt lở nguy hiểm được cảnh báo", MlCategory::Landslide),
    ("Sạt lở đất đá vùi lấp xe khách", MlCategory::Landslide),
    ("Núi lở gây chết người tại vùng cao", MlCategory::Landslide),
    ("Đường bị sạt lở chia cắt nhiều thôn bản", MlCategory::Landslide),
    ("Lở đất cuốn trôi cầu tạm", MlCategory::Landslide),
    ("Sạt lở bờ sông đe dọa nhà dân", MlCategory::Landslide),
    // drought
    ("Hạn hán kéo dài gây thiệt hại nặng cho nông nghiệp", MlCategory::Drought),
    ("Hàng nghìn hecta lúa chết khô vì thiếu nước", MlCategory::Drought),
    ("Nắng nóng kỷ lục gây hạn nghiêm trọng", MlCategory::Drought),
    ("Người dân thiếu nước sinh hoạt trầm trọng", MlCategory::Drought),
    ("Các hồ chứa cạn trơ đáy", MlCategory::Drought),
    ("Hạn mặn xâm nhập sâu vào nội đồng", MlCategory::Drought),
    ("Đất nứt nẻ vì khô hạn kéo dài", MlCategory::Drought),
    ("Cây trồng chết hàng loạt do hạn hán", MlCategory::Drought),
    ("Nguồn nước ngầm suy giảm nghiêm trọng", MlCategory::Drought),
    ("Tình trạng thiếu nước báo động", MlCategory::Drought),
    // fire
    ("Cháy rừng lan rộng tại Nghệ An", MlCategory::Fire),
    ("Đám cháy lớn thiêu rụi hàng chục hecta rừng", MlCategory::Fire),
    ("Cháy nhà máy gây thiệt hại lớn", MlCategory::Fire),
    ("Lửa bùng phát dữ dội tại khu công nghiệp", MlCategory::Fire),
    ("Hỏa hoạn thiêu rụi kho hàng", MlCategory::Fire),
    ("Cháy chung cư cao tầng khiến nhiều người mắc kẹt", MlCategory::Fire),
    ("Cháy rừng thông gây ô nhiễm không khí", MlCategory::Fire),
    ("Nắng nóng làm tăng nguy cơ cháy rừng", MlCategory::Fire),
    ("Cháy lan nhanh do gió lớn", MlCategory::Fire),
    ("Lực lượng PCCC khống chế đám cháy", MlCategory::Fire),
    // non-disaster
    ("Thị trường chứng khoán tăng mạnh trong phiên giao dịch", MlCategory::NonDisaster),
    ("Đội tuyển Việt Nam thắng đậm trong trận đấu", MlCategory::NonDisaster),
    ("Giá vàng biến động nhẹ cuối tuần", MlCategory::NonDisaster),
    ("Chính phủ họp bàn phát triển kinh tế", MlCategory::NonDisaster),
    ("Festival âm nhạc thu hút đông đảo khán giả", MlCategory::NonDisaster),
    ("Khai mạc hội chợ thương mại quốc tế", MlCategory::NonDisaster),
    ("Đường cao tốc mới được khánh thành", MlCategory::NonDisaster),
    ("Học sinh tựu trường năm học mới", MlCategory::NonDisaster),
    ("Thời tiết đẹp thuận lợi cho du lịch", MlCategory::NonDisaster),
    ("Doanh nghiệp công bố kết quả kinh doanh quý", MlCategory::NonDisaster),
    ("Lễ hội mùa xuân diễn ra sôi nổi", MlCategory::NonDisaster),
    ("Công nghệ mới được giới thiệu tại triển lãm", MlCategory::NonDisaster),
];

/// Owned copy of the built-in corpus, ready to be extended.
pub fn training_samples() -> Vec<(String, MlCategory)> {
    TRAINING_DATA
        .iter()
        .map(|(text, label)| (text.to_string(), *label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_is_covered() {
        for category in MlCategory::ALL {
            assert!(
                TRAINING_DATA.iter().any(|(_, label)| *label == category),
                "no samples for {}",
                category.as_str()
            );
        }
        assert_eq!(TRAINING_DATA.len(), 76);
    }
}
