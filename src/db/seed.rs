/// Starter topics for a fresh install, as `(topic, comma-separated keywords)`.
pub const STARTER_TOPICS: &[(&str, &str)] = &[
    ("황토집의 건강상 이점과 실제 효과", "황토집, 건강, 효과"),
    ("황토방 시공 과정과 주의사항", "황토방, 시공, 건축"),
    ("전통 한옥과 현대식 황토집의 차이점", "한옥, 황토집, 전통"),
    ("황토집에서 겨울나기 난방 관리법", "황토집, 난방, 겨울"),
    ("황토 벽돌 vs 황토 미장 어떤 것이 좋을까", "황토, 벽돌, 미장"),
    ("황토집 짓기 전 반드시 알아야 할 10가지", "황토집, 건축, 팁"),
    ("황토집 습도 조절 원리와 방법", "황토집, 습도, 조절"),
    ("황토 건축 비용과 예산 계획하기", "황토, 건축, 비용"),
    ("황토집의 단열 성능과 에너지 효율", "황토집, 단열, 에너지"),
    ("자연 소재를 활용한 친환경 주택 짓기", "친환경, 주택, 자연소재"),
    ("황토집 유지보수와 관리 요령", "황토집, 유지보수, 관리"),
    ("황토방 곰팡이 예방과 대처법", "황토방, 곰팡이, 예방"),
    ("전원주택으로 황토집을 선택하는 이유", "전원주택, 황토집, 선택"),
    ("황토집과 아토피 개선 실제 사례", "황토집, 아토피, 건강"),
    ("황토 건축의 역사와 현대적 재해석", "황토, 건축, 역사"),
    ("황토집 시공 업체 선정 기준과 체크리스트", "황토집, 업체, 선정"),
    ("황토방 인테리어 아이디어와 꾸미기 팁", "황토방, 인테리어, 꾸미기"),
    ("황토집 장단점 솔직 후기", "황토집, 장단점, 후기"),
    ("소형 황토집 설계 아이디어", "소형, 황토집, 설계"),
    ("황토집에 어울리는 가구와 소품", "황토집, 가구, 소품"),
    ("황토 건축 자재 선택 가이드", "황토, 자재, 선택"),
    ("전통 방식의 황토 시공법", "전통, 황토, 시공법"),
    ("현대식 황토 건축 기술의 발전", "현대식, 황토, 기술"),
    ("황토집에서 키우기 좋은 식물", "황토집, 식물, 키우기"),
    ("황토집 환기 시스템과 공기 순환", "황토집, 환기, 공기순환"),
    ("부동산 투자로서의 황토집 가치", "부동산, 황토집, 투자"),
    ("전원생활을 위한 황토집 입지 선정", "전원생활, 황토집, 입지"),
    ("황토집과 일반 주택의 비용 비교", "황토집, 일반주택, 비용"),
    ("황토 리모델링으로 기존 집 개선하기", "황토, 리모델링, 개선"),
    ("황토집 냄새와 실내 공기질 관리", "황토집, 냄새, 공기질"),
];
